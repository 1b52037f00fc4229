//! Storage folder resolution.
//!
//! The chosen folder is remembered as an [`AccessToken`] in the settings
//! file. At startup the token is resolved; if it no longer points at a
//! readable folder the default folder is used instead and the caller is told
//! that a fallback happened.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::io::settings_io::{self, clear_token, read_settings_doc, set_token, write_settings_doc};
use crate::io::store::StoreError;
use crate::model::config::AccessToken;

/// Name of the default storage folder inside the documents directory
pub const DEFAULT_FOLDER_NAME: &str = "Daybook";

/// The default storage folder: `~/Documents/Daybook`
pub fn default_folder() -> PathBuf {
    settings_io::home_dir()
        .join("Documents")
        .join(DEFAULT_FOLDER_NAME)
}

/// Outcome of resolving the storage folder at startup
#[derive(Debug)]
pub struct FolderResolution {
    /// Folder to use for this run
    pub folder: PathBuf,
    /// True when a configured folder could not be used
    pub fell_back: bool,
    /// Why the configured folder was rejected
    pub notice: Option<StoreError>,
}

/// Check that `path` is an existing, readable directory.
/// Returns its canonical form.
pub fn validate_folder(path: &Path) -> Result<PathBuf, StoreError> {
    if !path.is_dir() {
        return Err(StoreError::InvalidFolder {
            path: path.to_path_buf(),
        });
    }
    if let Err(e) = fs::read_dir(path) {
        return Err(if e.kind() == ErrorKind::PermissionDenied {
            StoreError::FolderAccessDenied {
                path: path.to_path_buf(),
            }
        } else {
            StoreError::FileAccessError {
                path: path.to_path_buf(),
                source: e,
            }
        });
    }
    fs::canonicalize(path).map_err(|e| StoreError::FileAccessError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create `path` (and parents) if it does not exist yet.
pub fn ensure_folder(path: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(path).map_err(|e| StoreError::FolderCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Persist a token for `folder`, replacing the previous one.
fn persist_token(settings_path: &Path, folder: &Path) -> Result<(), StoreError> {
    let token = AccessToken {
        path: folder.to_path_buf(),
        created: Utc::now(),
    };
    let mut doc = read_settings_doc(settings_path);
    set_token(&mut doc, &token);
    write_settings_doc(settings_path, &doc).map_err(|e| StoreError::BookmarkCreationFailed {
        reason: format!("{}: {}", settings_path.display(), e),
    })
}

/// Resolve the folder to use, falling back to `default`.
///
/// Only failing to create the default folder is an error. A configured
/// folder that vanished or became unreadable yields the default with
/// `fell_back` set; the token is kept so the folder is picked up again once
/// it reappears.
pub fn resolve_folder(settings_path: &Path, default: &Path) -> Result<FolderResolution, StoreError> {
    let settings = settings_io::read_settings_from(settings_path);

    if let Some(token) = settings.storage.token {
        match validate_folder(&token.path) {
            Ok(canonical) => {
                if canonical != token.path {
                    // The folder moved under a new name; refresh the token
                    tracing::info!(
                        old = %token.path.display(),
                        new = %canonical.display(),
                        "refreshing stale folder token"
                    );
                    if let Err(e) = persist_token(settings_path, &canonical) {
                        tracing::warn!("{}", e);
                    }
                }
                return Ok(FolderResolution {
                    folder: canonical,
                    fell_back: false,
                    notice: None,
                });
            }
            Err(e) => {
                tracing::warn!(
                    folder = %token.path.display(),
                    "configured folder unusable, using default: {}",
                    e
                );
                ensure_folder(default)?;
                return Ok(FolderResolution {
                    folder: default.to_path_buf(),
                    fell_back: true,
                    notice: Some(e),
                });
            }
        }
    }

    ensure_folder(default)?;
    Ok(FolderResolution {
        folder: default.to_path_buf(),
        fell_back: false,
        notice: None,
    })
}

/// Switch storage to `new_folder` for this and future runs.
///
/// The folder must already exist and be readable; nothing is persisted
/// otherwise. Returns the canonical folder path.
pub fn change_folder(settings_path: &Path, new_folder: &Path) -> Result<PathBuf, StoreError> {
    let canonical = validate_folder(new_folder)?;
    persist_token(settings_path, &canonical)?;
    tracing::info!(folder = %canonical.display(), "storage folder changed");
    Ok(canonical)
}

/// Forget the chosen folder; the default is used from the next start.
pub fn reset_folder(settings_path: &Path) -> Result<(), StoreError> {
    if !settings_path.exists() {
        return Ok(());
    }
    let mut doc = read_settings_doc(settings_path);
    clear_token(&mut doc);
    write_settings_doc(settings_path, &doc).map_err(|e| StoreError::BookmarkCreationFailed {
        reason: format!("{}: {}", settings_path.display(), e),
    })
}

/// Abbreviate a path by replacing $HOME with ~
pub fn abbreviate_path(path: &Path) -> String {
    let path = path.to_string_lossy();
    if let Ok(home) = std::env::var("HOME")
        && let Some(rest) = path.strip_prefix(&home)
    {
        return format!("~{}", rest);
    }
    path.to_string()
}
