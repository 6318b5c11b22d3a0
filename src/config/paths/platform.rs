//! Platform directories: config home and the default Chrome profile.

use crate::error::ApiError;
use directories::BaseDirs;
use std::path::PathBuf;

/// Directory holding the global config file (`<config dir>/marksync`).
pub fn config_home() -> Result<PathBuf, ApiError> {
    let base = BaseDirs::new().ok_or_else(|| {
        ApiError::ConfigError("Could not determine home directory".to_string())
    })?;
    Ok(base.config_dir().join("marksync"))
}

/// `Bookmarks` file of Chrome's default profile on this platform.
///
/// Windows: `%LOCALAPPDATA%\Google\Chrome\User Data\Default\Bookmarks`
/// macOS: `~/Library/Application Support/Google/Chrome/Default/Bookmarks`
/// Linux: `~/.config/google-chrome/Default/Bookmarks`
pub fn default_chrome_bookmarks_path() -> Result<PathBuf, ApiError> {
    let base = BaseDirs::new().ok_or_else(|| {
        ApiError::ConfigError(
            "Could not determine home directory for the Chrome profile".to_string(),
        )
    })?;
    Ok(chrome_profile_dir(&base).join("Default").join("Bookmarks"))
}

#[cfg(target_os = "windows")]
fn chrome_profile_dir(base: &BaseDirs) -> PathBuf {
    base.data_local_dir()
        .join("Google")
        .join("Chrome")
        .join("User Data")
}

#[cfg(target_os = "macos")]
fn chrome_profile_dir(base: &BaseDirs) -> PathBuf {
    base.data_dir().join("Google").join("Chrome")
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn chrome_profile_dir(base: &BaseDirs) -> PathBuf {
    base.config_dir().join("google-chrome")
}
