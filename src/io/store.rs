use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::io::recovery::{self, RecoveryEntry};
use crate::model::config::DEFAULT_ACTIVE_FILE;
use crate::model::todo::{Checkbox, TodoItem};
use crate::parse::{day_file_name, parse_checklist, parse_day_file_name, serialize_checklist};

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("access to {path} was denied")]
    FolderAccessDenied { path: PathBuf },
    #[error("could not create folder {path}: {source}")]
    FolderCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not save folder access: {reason}")]
    BookmarkCreationFailed { reason: String },
    #[error("could not access {path}: {source}")]
    FileAccessError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a usable folder")]
    InvalidFolder { path: PathBuf },
}

/// Durable mapping between todo collections and checklist files.
///
/// Loads never fail: a missing or unreadable file is an empty collection.
/// Saves surface a [`StoreError`].
pub trait TodoStore {
    /// Load unchecked items, scheduling each for `scheduled`.
    fn load_active(&self, scheduled: NaiveDate) -> Vec<TodoItem>;

    /// Replace the active file with `items`.
    fn save_active(&self, items: &[TodoItem]) -> Result<(), StoreError>;

    /// Load the checked items recorded for `day`.
    fn load_completed(&self, day: NaiveDate) -> Vec<TodoItem>;

    /// Append `items` to the file for `day`. Empty `items` is a no-op.
    fn save_completed(&self, items: &[TodoItem], day: NaiveDate) -> Result<(), StoreError>;

    /// Rewrite the file for `day` with exactly `items`.
    ///
    /// Never creates a file for an empty set and never deletes one: an
    /// existing file is truncated instead.
    fn replace_completed(&self, items: &[TodoItem], day: NaiveDate) -> Result<(), StoreError>;

    /// Days that have a completed file, ascending.
    fn list_completed_days(&self) -> Vec<NaiveDate>;

    /// Record a deleted item somewhere it can be recovered from.
    fn record_deletion(&self, _item: &TodoItem) {}
}

/// A [`TodoStore`] backed by a folder of markdown checklist files.
#[derive(Debug, Clone)]
pub struct FolderStore {
    folder: PathBuf,
    active_file: String,
}

impl FolderStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        FolderStore {
            folder: folder.into(),
            active_file: DEFAULT_ACTIVE_FILE.to_string(),
        }
    }

    /// Use a different name for the file of unchecked items.
    pub fn with_active_file(mut self, name: impl Into<String>) -> Self {
        self.active_file = name.into();
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn active_path(&self) -> PathBuf {
        self.folder.join(&self.active_file)
    }

    pub fn day_path(&self, day: NaiveDate) -> PathBuf {
        self.folder.join(day_file_name(day))
    }

    /// Read a file, treating "not found" as `None`.
    fn read_existing(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::FileAccessError {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Read a file for a load: failures degrade to `None` and are logged.
    fn read_for_load(path: &Path) -> Option<String> {
        match Self::read_existing(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    fn load_checklist(path: &Path, wanted: Checkbox, date: NaiveDate) -> Vec<TodoItem> {
        let Some(content) = Self::read_for_load(path) else {
            return Vec::new();
        };
        let parsed = parse_checklist(&content, wanted);
        if !parsed.dropped.is_empty() {
            tracing::debug!(
                file = %path.display(),
                skipped = parsed.dropped.len(),
                "skipped malformed lines"
            );
        }
        parsed
            .titles
            .into_iter()
            .map(|title| match wanted {
                Checkbox::Unchecked => TodoItem::active(title, date),
                Checkbox::Checked => TodoItem::completed(title, date),
            })
            .collect()
    }

    /// Write `content` to `path`, stashing it in the recovery log on failure.
    fn write_file(&self, path: &Path, content: String) -> Result<(), StoreError> {
        let target = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if !self.folder.is_dir() {
            tracing::warn!(folder = %self.folder.display(), "storage folder is missing");
            return Err(StoreError::InvalidFolder {
                path: self.folder.clone(),
            });
        }

        if let Err(e) = recovery::atomic_write(path, content.as_bytes()) {
            tracing::warn!(file = %path.display(), "write failed: {}", e);
            recovery::log_recovery(
                &self.folder,
                RecoveryEntry::write_failure(&target, &e.to_string(), content),
            );
            return Err(StoreError::FileAccessError {
                path: path.to_path_buf(),
                source: e,
            });
        }
        tracing::debug!(file = %path.display(), "saved");
        Ok(())
    }
}

impl TodoStore for FolderStore {
    fn load_active(&self, scheduled: NaiveDate) -> Vec<TodoItem> {
        Self::load_checklist(&self.active_path(), Checkbox::Unchecked, scheduled)
    }

    fn save_active(&self, items: &[TodoItem]) -> Result<(), StoreError> {
        self.write_file(&self.active_path(), serialize_checklist(items))
    }

    fn load_completed(&self, day: NaiveDate) -> Vec<TodoItem> {
        Self::load_checklist(&self.day_path(day), Checkbox::Checked, day)
    }

    fn save_completed(&self, items: &[TodoItem], day: NaiveDate) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }
        let path = self.day_path(day);
        let addition = serialize_checklist(items);
        let content = match Self::read_existing(&path)? {
            Some(existing) if !existing.is_empty() => format!("{}\n{}", existing, addition),
            _ => addition,
        };
        self.write_file(&path, content)
    }

    fn replace_completed(&self, items: &[TodoItem], day: NaiveDate) -> Result<(), StoreError> {
        let path = self.day_path(day);
        if items.is_empty() && !path.exists() {
            return Ok(());
        }
        self.write_file(&path, serialize_checklist(items))
    }

    fn list_completed_days(&self) -> Vec<NaiveDate> {
        let entries = match fs::read_dir(&self.folder) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(folder = %self.folder.display(), "could not list folder: {}", e);
                return Vec::new();
            }
        };

        let mut days: Vec<NaiveDate> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if name == self.active_file {
                    return None;
                }
                parse_day_file_name(&name)
            })
            .collect();
        days.sort();
        days.dedup();
        days
    }

    fn record_deletion(&self, item: &TodoItem) {
        let bucket = if item.is_completed {
            day_file_name(item.date)
        } else {
            self.active_file.clone()
        };
        recovery::log_todo_deletion(&self.folder, &bucket, &crate::parse::serialize_item(item));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn titles(items: &[TodoItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn active_round_trip_preserves_order() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let today = day("2025-06-15");
        let items = vec![
            TodoItem::active("Write report", today),
            TodoItem::active("Buy milk", today),
            TodoItem::active("Call mom", today),
        ];

        store.save_active(&items).unwrap();
        let loaded = store.load_active(today);

        assert_eq!(titles(&loaded), vec!["Write report", "Buy milk", "Call mom"]);
        assert!(loaded.iter().all(|i| !i.is_completed && i.date == today));
        assert_eq!(
            fs::read_to_string(store.active_path()).unwrap(),
            "- [ ] Write report\n- [ ] Buy milk\n- [ ] Call mom"
        );
    }

    #[test]
    fn save_active_replaces_file() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let today = day("2025-06-15");
        store
            .save_active(&[TodoItem::active("Old", today)])
            .unwrap();
        store
            .save_active(&[TodoItem::active("New", today)])
            .unwrap();
        assert_eq!(titles(&store.load_active(today)), vec!["New"]);
    }

    #[test]
    fn missing_files_load_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        assert!(store.load_active(day("2025-06-15")).is_empty());
        assert!(store.load_completed(day("2025-06-15")).is_empty());
    }

    #[test]
    fn missing_folder_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path().join("gone"));
        assert!(store.load_active(day("2025-06-15")).is_empty());
        assert!(store.list_completed_days().is_empty());
    }

    #[test]
    fn completed_round_trip_tags_day() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let d = day("2025-06-14");
        store
            .save_completed(
                &[TodoItem::completed("Ship it", d), TodoItem::completed("Tidy", d)],
                d,
            )
            .unwrap();

        let loaded = store.load_completed(d);
        assert_eq!(titles(&loaded), vec!["Ship it", "Tidy"]);
        assert!(loaded.iter().all(|i| i.is_completed && i.date == d));
        assert!(tmp.path().join("2025-06-14.md").exists());
    }

    #[test]
    fn save_completed_appends_to_existing() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let d = day("2025-06-14");
        store
            .save_completed(&[TodoItem::completed("First", d)], d)
            .unwrap();
        store
            .save_completed(&[TodoItem::completed("Second", d)], d)
            .unwrap();

        assert_eq!(
            fs::read_to_string(store.day_path(d)).unwrap(),
            "- [x] First\n- [x] Second"
        );
    }

    #[test]
    fn save_completed_empty_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let d = day("2025-06-14");
        store.save_completed(&[], d).unwrap();
        assert!(!store.day_path(d).exists());
    }

    #[test]
    fn save_completed_empty_keeps_existing() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let d = day("2025-06-14");
        fs::write(store.day_path(d), "- [x] Kept").unwrap();
        store.save_completed(&[], d).unwrap();
        assert_eq!(fs::read_to_string(store.day_path(d)).unwrap(), "- [x] Kept");
    }

    #[test]
    fn replace_completed_truncates_but_keeps_file() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let d = day("2025-06-14");
        fs::write(store.day_path(d), "- [x] One\n- [x] Two").unwrap();

        store.replace_completed(&[], d).unwrap();
        assert!(store.day_path(d).exists());
        assert_eq!(fs::read_to_string(store.day_path(d)).unwrap(), "");

        let other = day("2025-06-13");
        store.replace_completed(&[], other).unwrap();
        assert!(!store.day_path(other).exists());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        let d = day("2025-06-14");
        fs::write(store.active_path(), "- [ ] Real\nnot a todo\n- [x] wrong state\n").unwrap();
        fs::write(store.day_path(d), "not a todo\n- [x] Done\n- [ ] wrong state").unwrap();

        assert_eq!(titles(&store.load_active(d)), vec!["Real"]);
        assert_eq!(titles(&store.load_completed(d)), vec!["Done"]);
    }

    #[test]
    fn list_completed_days_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        for name in [
            "2025-06-14.md",
            "2025-01-01.md",
            "todo.md",
            "notes.md",
            "2025-02-30.md",
            "2025-03-03.txt",
        ] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        fs::create_dir(tmp.path().join("2025-04-04.md")).unwrap();

        assert_eq!(
            store.list_completed_days(),
            vec![day("2025-01-01"), day("2025-06-14")]
        );
    }

    #[test]
    fn custom_active_file_is_excluded() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path()).with_active_file("inbox.md");
        let today = day("2025-06-15");
        store
            .save_active(&[TodoItem::active("Queued", today)])
            .unwrap();
        assert!(tmp.path().join("inbox.md").exists());
        assert!(store.list_completed_days().is_empty());
    }

    #[test]
    fn save_into_missing_folder_is_invalid_folder() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path().join("vanished"));
        let err = store
            .save_active(&[TodoItem::active("Lost", day("2025-06-15"))])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidFolder { .. }));
    }

    #[test]
    fn record_deletion_writes_recovery_entry() {
        let tmp = TempDir::new().unwrap();
        let store = FolderStore::new(tmp.path());
        store.record_deletion(&TodoItem::completed("Gone", day("2025-06-14")));
        let entries = recovery::read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, "- [x] Gone");
        assert_eq!(
            entries[0].fields,
            vec![("Bucket".to_string(), "2025-06-14.md".to_string())]
        );
    }
}
