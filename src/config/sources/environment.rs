//! Environment variable source: MARKSYNC_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add the environment overlay to builder.
/// `MARKSYNC__BOOKMARKS__ROOT=other` sets `bookmarks.root`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("MARKSYNC")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
