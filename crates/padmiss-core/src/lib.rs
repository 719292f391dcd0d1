//! # padmiss-core
//!
//! Persistent configuration for the Padmiss score-input tools.
//!
//! The tools talk to USB score scanners, named-pipe score sources and the
//! Padmiss web API.  None of that lives here: this crate owns the single JSON
//! document those collaborators read their settings from, and the
//! [`ConfigManager`] that finds, bootstraps, validates and saves it.
//!
//! - **`domain`** – The configuration document itself ([`Configuration`],
//!   [`DeviceConfig`], ...), the structural validator that turns a raw JSON
//!   value into a typed document or a list of [`Violation`]s, and key/value
//!   editing of scalar settings.
//!
//! - **`storage`** – Everything that touches the file system: platform path
//!   resolution, first-run bootstrap, load and save, and the change-listener
//!   registry that is notified after every successful save.
//!
//! # Example
//!
//! ```no_run
//! use padmiss_core::ConfigManager;
//!
//! # fn main() -> Result<(), padmiss_core::ConfigError> {
//! let manager = ConfigManager::new(None)?;
//! manager.on_change(|| println!("configuration saved"));
//!
//! let mut config = manager.load_config()?;
//! config.hide_on_start = true;
//! manager.save_config(&config)?;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod error;
pub mod storage;

pub use domain::config::{
    Configuration, DeviceConfig, DeviceKind, FifoConfig, ScannerConfig, DEFAULT_API_URL,
    DEFAULT_PROFILE_DIR_NAME,
};
pub use domain::validation::Violation;
pub use error::{ConfigError, ErrorKind};
pub use storage::listeners::{ListenerId, ListenerRegistry};
pub use storage::manager::ConfigManager;
