//! Global config file source: `<config dir>/marksync/config.toml`, optional.

use crate::config::paths::platform;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let Ok(dir) = platform::config_home() else {
        return Ok(builder);
    };
    let path = dir.join("config.toml");
    Ok(builder.add_source(File::from(path).required(false)))
}
