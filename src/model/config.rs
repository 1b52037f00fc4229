use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default name of the file holding unchecked items
pub const DEFAULT_ACTIVE_FILE: &str = "todo.md";

/// Default number of days shown either side of today
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Largest accepted window; larger settings are clamped to it
pub const MAX_WINDOW_DAYS: i64 = 3660;

/// Configuration from settings.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_active_file")]
    pub active_file: String,
    /// Persisted access token for a user-chosen folder.
    /// Absent means the default folder is in use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AccessToken>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            active_file: default_active_file(),
            token: None,
        }
    }
}

/// Opaque record granting access to a chosen storage folder.
///
/// Resolved at startup; discarded and replaced whenever the folder changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub path: PathBuf,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

fn default_active_file() -> String {
    DEFAULT_ACTIVE_FILE.to_string()
}

fn default_window_days() -> i64 {
    DEFAULT_WINDOW_DAYS
}
