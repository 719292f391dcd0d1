//! Storage infrastructure: configuration file persistence.
//!
//! - `paths` resolves the per-user base directory (`%APPDATA%\Padmiss` on
//!   Windows, `~/.padmiss` elsewhere).
//! - `manager` bootstraps that directory on first run, loads and validates
//!   `config.json`, and writes edits back.
//! - `listeners` holds the callbacks invoked after each successful save.

pub mod listeners;
pub mod manager;
pub mod paths;
