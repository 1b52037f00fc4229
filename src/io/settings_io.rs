use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::{AccessToken, Settings};

/// Get the settings file path, respecting XDG_CONFIG_HOME
pub fn settings_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    config_dir.join("daybook").join("settings.toml")
}

/// Get the user's home directory
pub fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Read settings from a specific path.
/// If the file doesn't exist, returns defaults.
/// If the file is corrupted, backs it up as .bak and returns defaults.
pub fn read_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }

    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<Settings>(&content) {
            Ok(settings) => settings,
            Err(e) => {
                let bak = path.with_extension("toml.bak");
                let _ = fs::copy(path, &bak);
                tracing::warn!(
                    "could not parse {} (backed up as {}): {}",
                    path.display(),
                    bak.display(),
                    e
                );
                Settings::default()
            }
        },
        Err(e) => {
            tracing::warn!("could not read {}: {}", path.display(), e);
            Settings::default()
        }
    }
}

/// Read the raw settings document for round-trip-safe editing.
/// A missing or unparsable file yields an empty document.
pub fn read_settings_doc(path: &Path) -> toml_edit::DocumentMut {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| text.parse::<toml_edit::DocumentMut>().ok())
        .unwrap_or_default()
}

/// Write the settings document back to disk, preserving formatting.
pub fn write_settings_doc(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    crate::io::recovery::atomic_write(path, doc.to_string().as_bytes())
}

/// Store an access token under `[storage.token]`, replacing any previous one
pub fn set_token(doc: &mut toml_edit::DocumentMut, token: &AccessToken) {
    if !doc.contains_key("storage") {
        doc["storage"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let mut table = toml_edit::Table::new();
    table["path"] = toml_edit::value(token.path.to_string_lossy().to_string());
    table["created"] = toml_edit::value(
        token
            .created
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    );
    doc["storage"]["token"] = toml_edit::Item::Table(table);
}

/// Remove the access token, if any
pub fn clear_token(doc: &mut toml_edit::DocumentMut) {
    if let Some(storage) = doc.get_mut("storage").and_then(|s| s.as_table_mut()) {
        storage.remove("token");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_settings() -> &'static str {
        r#"# my daybook settings
[storage]
active_file = "todo.md"

[timeline]
window_days = 14 # two weeks
"#
    }

    fn token() -> AccessToken {
        AccessToken {
            path: PathBuf::from("/tmp/todos"),
            created: Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_read_missing_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = read_settings_from(&tmp.path().join("settings.toml"));
        assert!(settings.storage.token.is_none());
        assert_eq!(settings.timeline.window_days, 30);
    }

    #[test]
    fn test_corrupted_settings_backup() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "not valid toml [[[").unwrap();
        let settings = read_settings_from(&path);
        assert!(settings.storage.token.is_none());
        assert!(path.with_extension("toml.bak").exists());
    }

    #[test]
    fn test_round_trip_doc_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("daybook").join("settings.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, sample_settings()).unwrap();

        let doc = read_settings_doc(&path);
        write_settings_doc(&path, &doc).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), sample_settings());
    }

    #[test]
    fn test_set_token_round_trips_through_settings() {
        let mut doc: toml_edit::DocumentMut = sample_settings().parse().unwrap();
        set_token(&mut doc, &token());
        let text = doc.to_string();
        assert!(text.contains("# my daybook settings"));
        assert!(text.contains("window_days = 14 # two weeks"));

        let settings: Settings = toml::from_str(&text).unwrap();
        assert_eq!(settings.storage.token, Some(token()));
        assert_eq!(settings.timeline.window_days, 14);
    }

    #[test]
    fn test_set_token_on_empty_doc() {
        let mut doc = toml_edit::DocumentMut::new();
        set_token(&mut doc, &token());
        let settings: Settings = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(settings.storage.token, Some(token()));
        assert_eq!(settings.storage.active_file, "todo.md");
    }

    #[test]
    fn test_clear_token() {
        let mut doc: toml_edit::DocumentMut = sample_settings().parse().unwrap();
        set_token(&mut doc, &token());
        clear_token(&mut doc);
        let settings: Settings = toml::from_str(&doc.to_string()).unwrap();
        assert!(settings.storage.token.is_none());
        assert_eq!(settings.storage.active_file, "todo.md");
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("daybook").join("settings.toml");
        let mut doc = toml_edit::DocumentMut::new();
        set_token(&mut doc, &token());
        write_settings_doc(&path, &doc).unwrap();
        assert_eq!(read_settings_from(&path).storage.token, Some(token()));
    }
}
