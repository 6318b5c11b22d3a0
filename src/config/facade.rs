//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::MarksyncConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<MarksyncConfig, ApiError> {
        MergeService::load(workspace_root)
            .map_err(|e| ApiError::ConfigError(format!("Failed to load config: {}", e)))
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<MarksyncConfig, ApiError> {
        MergeService::load_from_file(path).map_err(|e| {
            ApiError::ConfigError(format!("Failed to load config {}: {}", path.display(), e))
        })
    }

    /// Explicit file when given, standard sources otherwise.
    pub fn resolve(workspace_root: &Path, file: Option<&Path>) -> Result<MarksyncConfig, ApiError> {
        match file {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }
}
