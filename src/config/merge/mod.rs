//! Config composition: defaults and the merge service.

pub mod service;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the built-in defaults (lowest precedence).
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("bookmarks.root", "bookmark_bar")?
        .set_default("bookmarks.backup", true)?
        .set_default("snapshot.path", "bookmarks.yaml")
}
