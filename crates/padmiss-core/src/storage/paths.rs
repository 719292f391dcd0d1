//! Platform resolution of the Padmiss base directory.
//!
//! - Windows:  `%APPDATA%\Padmiss`
//! - Elsewhere: `$HOME/.padmiss`
//!
//! The config file is `config.json` directly inside it and backups default to
//! its `backups` subdirectory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// File name of the configuration document inside the base directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Subdirectory created on first run for backups.
pub const BACKUPS_DIR_NAME: &str = "backups";

/// Environment variable the base directory is derived from.
#[cfg(windows)]
pub const BASE_DIR_ENV: &str = "APPDATA";
#[cfg(not(windows))]
pub const BASE_DIR_ENV: &str = "HOME";

/// Name of the Padmiss directory under [`BASE_DIR_ENV`].
#[cfg(windows)]
pub const APP_DIR_NAME: &str = "Padmiss";
#[cfg(not(windows))]
pub const APP_DIR_NAME: &str = ".padmiss";

/// Determines the platform-appropriate Padmiss base directory from the value
/// of [`BASE_DIR_ENV`] (`std::env::var_os(BASE_DIR_ENV)`).
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when `root` is `None` or
/// empty.
pub fn resolve_base_dir(root: Option<OsString>) -> Result<PathBuf, ConfigError> {
    base_dir_from(root).ok_or(ConfigError::NoPlatformConfigDir)
}

/// Joins [`APP_DIR_NAME`] onto the value of [`BASE_DIR_ENV`], if there is one.
pub fn base_dir_from(root: Option<OsString>) -> Option<PathBuf> {
    root.filter(|value| !value.is_empty())
        .map(|value| PathBuf::from(value).join(APP_DIR_NAME))
}

/// `config.json` inside `base`.
pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE_NAME)
}

/// The backups directory inside `base`.
pub fn backups_dir_in(base: &Path) -> PathBuf {
    base.join(BACKUPS_DIR_NAME)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
