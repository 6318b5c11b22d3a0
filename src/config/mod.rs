//! Configuration
//!
//! Layered configuration built with the `config` crate. Precedence, lowest to
//! highest: built-in defaults, global file (`<config dir>/marksync/config.toml`),
//! workspace file (`marksync.toml`), `MARKSYNC__*` environment variables.
//! CLI flags are applied on top by the caller.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

use crate::backend::RootName;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use facade::ConfigLoader;

/// Chrome profile settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarksConfig {
    /// Path to the Chrome `Bookmarks` file; None means the platform default profile
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Root under reconciliation management
    #[serde(default)]
    pub root: RootName,

    /// Backup location; None means `Bookmarks.bak` next to the bookmarks file
    #[serde(default)]
    pub backup_path: Option<PathBuf>,

    /// Copy the bookmarks file aside before every import
    #[serde(default = "default_true")]
    pub backup: bool,
}

impl Default for BookmarksConfig {
    fn default() -> Self {
        Self {
            path: None,
            root: RootName::default(),
            backup_path: None,
            backup: default_true(),
        }
    }
}

impl BookmarksConfig {
    /// Bookmarks file to operate on.
    pub fn resolve_path(&self) -> Result<PathBuf, ApiError> {
        match &self.path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => paths::platform::default_chrome_bookmarks_path(),
        }
    }

    /// Backup destination, or None when backups are disabled.
    pub fn resolve_backup_path(&self, bookmarks_path: &Path) -> Option<PathBuf> {
        if !self.backup {
            return None;
        }
        match &self.backup_path {
            Some(path) if !path.as_os_str().is_empty() => Some(path.clone()),
            _ => Some(default_backup_path(bookmarks_path)),
        }
    }
}

fn default_backup_path(bookmarks_path: &Path) -> PathBuf {
    let file_name = bookmarks_path
        .file_name()
        .map(|name| format!("{}.bak", name.to_string_lossy()))
        .unwrap_or_else(|| "Bookmarks.bak".to_string());
    bookmarks_path.with_file_name(file_name)
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("bookmarks.yaml")
}

fn default_true() -> bool {
    true
}

/// Snapshot file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Snapshot file, relative to the workspace root
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

/// Complete marksync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarksyncConfig {
    #[serde(default)]
    pub bookmarks: BookmarksConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
