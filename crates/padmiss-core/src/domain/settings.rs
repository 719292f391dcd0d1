//! Reading and editing single scalar settings by their on-disk key.
//!
//! Used by front ends that edit one value at a time (`padmiss-config set
//! apiKey ...`).  Values arrive as strings and are checked with the same rules
//! the loader applies, so an edit can never produce a document that fails to
//! load again.  Devices are edited through the typed API instead.

use std::path::PathBuf;

use super::config::Configuration;
use super::validation::{check_api_url, Violation};

/// Keys accepted by [`get_setting`] and [`apply_setting`].
pub const SETTING_KEYS: [&str; 7] = [
    "apiUrl",
    "apiKey",
    "scoresDir",
    "backupDir",
    "profileDirName",
    "hideOnStart",
    "webserver",
];

/// Returns the current value of `key` as a string.
///
/// # Errors
///
/// Returns a [`Violation`] if `key` is not one of [`SETTING_KEYS`].
pub fn get_setting(config: &Configuration, key: &str) -> Result<String, Violation> {
    let value = match key {
        "apiUrl" => config.api_url.to_string(),
        "apiKey" => config.api_key.clone(),
        "scoresDir" => config.scores_dir.display().to_string(),
        "backupDir" => config.backup_dir.display().to_string(),
        "profileDirName" => config.profile_dir_name.clone(),
        "hideOnStart" => config.hide_on_start.to_string(),
        "webserver" => config.webserver_enabled().to_string(),
        _ => return Err(unknown_key(key)),
    };
    Ok(value)
}

/// Sets `key` to `value`.
///
/// # Errors
///
/// Returns a [`Violation`] naming `key` if the key is unknown or the value
/// is rejected.  `config` is left untouched in that case.
pub fn apply_setting(config: &mut Configuration, key: &str, value: &str) -> Result<(), Violation> {
    match key {
        "apiUrl" => {
            let url = check_api_url(value).map_err(|reason| Violation::new(key, reason))?;
            config.api_url = url;
        }
        "apiKey" => config.api_key = value.to_string(),
        "scoresDir" => config.scores_dir = PathBuf::from(value),
        "backupDir" => config.backup_dir = PathBuf::from(value),
        "profileDirName" => config.profile_dir_name = value.to_string(),
        "hideOnStart" => config.hide_on_start = parse_bool(key, value)?,
        "webserver" => config.webserver = Some(parse_bool(key, value)?),
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Violation> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Violation::new(key, "must be 'true' or 'false'")),
    }
}

fn unknown_key(key: &str) -> Violation {
    Violation::new(
        key,
        format!("unknown setting, expected one of: {}", SETTING_KEYS.join(", ")),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
