//! MergeService: orchestrates sources and deserializes to MarksyncConfig.

use super::builder_with_defaults;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::MarksyncConfig;
use config::{ConfigError, File};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from the standard sources.
    /// Precedence: defaults -> global file -> workspace file -> environment (highest).
    pub fn load(workspace_root: &Path) -> Result<MarksyncConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific file with the environment overlay.
    pub fn load_from_file(path: &Path) -> Result<MarksyncConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = builder.add_source(File::from(path).required(true));
        let builder = environment::add_to_builder(builder)?;

        builder.build()?.try_deserialize()
    }
}
