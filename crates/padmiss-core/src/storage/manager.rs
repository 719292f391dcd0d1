//! [`ConfigManager`]: locate, bootstrap, load and save `config.json`.
//!
//! A manager works in one of two modes, fixed at construction:
//!
//! - **Default path** ([`ConfigManager::new`] with `None`, or
//!   [`ConfigManager::with_base_dir`]): the file is `config.json` inside the
//!   Padmiss base directory.  The first [`load_config`] creates the base
//!   directory, its `backups` subdirectory and a default document.
//! - **Explicit path** ([`ConfigManager::new`] with `Some(path)`, or
//!   [`ConfigManager::with_config_file`]): the caller names the file.  Nothing
//!   is bootstrapped and a missing file is a [`ConfigError::NotFound`].
//!
//! The hosting application builds one manager at startup and hands an
//! `Arc<ConfigManager>` to every collaborator that reads or edits settings.
//!
//! # Saving
//!
//! [`save_config`] first checks the document against the same rules the
//! loader applies, so nothing is written that would fail to load back.  It
//! then renders the whole document into a uniquely named temporary file next
//! to the target, flushes it to disk and renames it over the target, then
//! notifies the registered listeners.  Concurrent saves through one manager
//! are serialised; listeners run after the lock is released.  Separate
//! processes writing the same file each use their own temporary file, so the
//! last rename wins and no writer sees the other's half-written data.
//!
//! # What is an atomic rename? (for beginners)
//!
//! Writing a file in place truncates it first and then fills it, so a crash
//! or a concurrent reader in between sees an empty or half-written file.
//! Renaming one file over another within the same directory is a single
//! operation on every platform Padmiss supports: a reader opens either the
//! complete old file or the complete new one.  The `tempfile` crate creates
//! the uniquely named scratch file (`.config.json.XXXXXX.tmp`), deletes it
//! if anything fails, and `NamedTempFile::persist` performs the rename.
//! `sync_all` flushes the data to disk before the rename so the new name
//! never points at unwritten blocks.
//!
//! [`load_config`]: ConfigManager::load_config
//! [`save_config`]: ConfigManager::save_config

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tempfile::Builder;
use tracing::{debug, info, warn};

use super::listeners::{ListenerId, ListenerRegistry};
use super::paths;
use crate::domain::config::Configuration;
use crate::error::ConfigError;

/// Where the configuration document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    /// `config.json` inside this base directory, bootstrapped on first load.
    BaseDir(PathBuf),
    /// A caller-supplied file.  Never bootstrapped.
    File(PathBuf),
}

/// Loads, validates and persists the Padmiss configuration document.
#[derive(Debug)]
pub struct ConfigManager {
    location: Location,
    listeners: ListenerRegistry,
    write_lock: Mutex<()>,
}

impl ConfigManager {
    /// Creates a manager for `custom_config_file`, or for the platform
    /// default location when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] if no path was given and
    /// the platform base directory cannot be determined.
    pub fn new(custom_config_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        match custom_config_file {
            Some(path) => Ok(Self::with_config_file(path)),
            None => Self::with_env_root(std::env::var_os(paths::BASE_DIR_ENV)),
        }
    }

    /// Default-path mode for an already-read value of
    /// [`BASE_DIR_ENV`](paths::BASE_DIR_ENV).
    fn with_env_root(root: Option<OsString>) -> Result<Self, ConfigError> {
        Ok(Self::with_base_dir(paths::resolve_base_dir(root)?))
    }

    /// Explicit-path mode for `path`.
    pub fn with_config_file(path: impl Into<PathBuf>) -> Self {
        Self::from_location(Location::File(path.into()))
    }

    /// Default-path mode rooted at `base_dir` instead of the platform
    /// directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self::from_location(Location::BaseDir(base_dir.into()))
    }

    fn from_location(location: Location) -> Self {
        let manager = Self {
            location,
            listeners: ListenerRegistry::new(),
            write_lock: Mutex::new(()),
        };
        debug!("config file resolved to {}", manager.config_path().display());
        manager
    }

    // ── Location ──────────────────────────────────────────────────────────────

    /// The resolved config file path.
    pub fn config_path(&self) -> PathBuf {
        match &self.location {
            Location::BaseDir(base) => paths::config_file_in(base),
            Location::File(path) => path.clone(),
        }
    }

    /// The base directory, in default-path mode.
    pub fn base_dir(&self) -> Option<&Path> {
        match &self.location {
            Location::BaseDir(base) => Some(base),
            Location::File(_) => None,
        }
    }

    /// Whether the manager was given an explicit file path.
    pub fn is_explicit_path(&self) -> bool {
        matches!(self.location, Location::File(_))
    }

    /// The directory `save_config` makes sure exists before writing.
    fn save_dir(&self) -> Option<&Path> {
        match &self.location {
            Location::BaseDir(base) => Some(base),
            Location::File(path) => path.parent().filter(|dir| !dir.as_os_str().is_empty()),
        }
    }

    /// The documented first-run document for this location.
    ///
    /// Backups go to `backups` next to the config file.
    pub fn default_config(&self) -> Configuration {
        let backups = match &self.location {
            Location::BaseDir(base) => paths::backups_dir_in(base),
            Location::File(path) => {
                paths::backups_dir_in(path.parent().unwrap_or_else(|| Path::new("")))
            }
        };
        Configuration::defaults(backups)
    }

    // ── Listeners ─────────────────────────────────────────────────────────────

    /// The listeners notified after each successful save.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Registers `listener` to run after each successful save.
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.register(listener)
    }

    /// Unregisters a listener added with [`on_change`](Self::on_change).
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.unregister(id)
    }

    // ── Load / save ───────────────────────────────────────────────────────────

    /// Whether a regular file exists at the config path.  The contents are
    /// not inspected.
    pub fn has_valid_config(&self) -> bool {
        self.config_path().is_file()
    }

    /// Loads and validates the configuration, bootstrapping the default
    /// location first when in default-path mode.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if an explicit path does not exist.
    /// - [`ConfigError::Validation`] if the file is not valid JSON or breaks
    ///   the schema.
    /// - [`ConfigError::Io`] if bootstrapping or reading fails.
    pub fn load_config(&self) -> Result<Configuration, ConfigError> {
        if let Location::BaseDir(base) = &self.location {
            self.bootstrap(base)?;
        }
        self.read_config()
    }

    /// Reads and validates the file without bootstrapping anything.
    ///
    /// # Errors
    ///
    /// Same as [`load_config`](Self::load_config), except that a missing file
    /// is [`ConfigError::NotFound`] in both modes.
    pub fn read_config(&self) -> Result<Configuration, ConfigError> {
        let path = self.config_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound { path });
            }
            Err(e) => return Err(ConfigError::io(path, e)),
        };

        let config = Configuration::from_json_str(&text).map_err(|violations| {
            ConfigError::Validation {
                path: path.clone(),
                violations,
            }
        })?;

        for (index, device) in config.devices.iter().enumerate() {
            if let Some(problem) = device.inconsistency() {
                warn!(
                    "device {index} ({}) in {}: {problem}",
                    device.path,
                    path.display()
                );
            }
        }

        debug!(
            "loaded config from {} ({} device(s))",
            path.display(),
            config.devices.len()
        );
        Ok(config)
    }

    /// Writes `config` to the config path, replacing the previous file, then
    /// notifies every listener in registration order.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Validation`] if `config` would not load back, e.g. an
    ///   `apiUrl` that is not http or https.  The file is left untouched.
    /// - [`ConfigError::Io`] if the directory cannot be created or the file
    ///   cannot be written.
    /// - [`ConfigError::Serialize`] if a path field is not valid UTF-8.
    ///
    /// Listeners are not notified on failure.
    pub fn save_config(&self, config: &Configuration) -> Result<(), ConfigError> {
        let path = self.config_path();

        let violations = config.violations()?;
        if !violations.is_empty() {
            warn!(
                "refusing to save invalid config to {}: {} violation(s)",
                path.display(),
                violations.len()
            );
            return Err(ConfigError::Validation { path, violations });
        }
        let content = config.to_pretty_json()?;

        {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

            if let Some(dir) = self.save_dir() {
                fs::create_dir_all(dir).map_err(|source| ConfigError::io(dir, source))?;
            }

            info!("saving config to {}", path.display());
            write_replacing(&path, content.as_bytes())?;
        }

        self.listeners.notify();
        Ok(())
    }

    /// Creates the base and backups directories and writes the default
    /// document if there is no config file yet.
    fn bootstrap(&self, base: &Path) -> Result<(), ConfigError> {
        for dir in [base.to_path_buf(), paths::backups_dir_in(base)] {
            if !dir.is_dir() {
                info!("directory {} does not exist, creating", dir.display());
                fs::create_dir_all(&dir).map_err(|source| ConfigError::io(&dir, source))?;
            }
        }

        if !paths::config_file_in(base).exists() {
            info!("saving default config");
            self.save_config(&self.default_config())?;
        }
        Ok(())
    }
}

/// Writes `contents` to a fresh temporary file in the target's directory,
/// syncs it and renames it into place, so readers never observe a partially
/// written file.  The temporary file is removed on any failure.
fn write_replacing(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = match path.file_name() {
        Some(name) => format!(".{}.", name.to_string_lossy()),
        None => format!(".{}.", paths::CONFIG_FILE_NAME),
    };

    let mut temp = Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|source| ConfigError::io(dir, source))?;
    temp.write_all(contents)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|source| ConfigError::io(temp.path(), source))?;

    temp.persist(path).map_err(|e| ConfigError::io(path, e.error))?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
