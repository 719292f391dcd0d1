//! The Padmiss configuration document.
//!
//! One JSON object per user, stored as `config.json` in the Padmiss base
//! directory.  Keys on disk are camelCase; the Rust fields are snake_case and
//! `serde` maps between the two:
//!
//! ```json
//! {
//!     "apiKey": "",
//!     "apiUrl": "https://api.padmiss.com/",
//!     "backupDir": "/home/user/.padmiss/backups",
//!     "devices": [
//!         {
//!             "fifoConfig": {
//!                 "path": "/tmp/pipe"
//!             },
//!             "path": "player1",
//!             "type": "fifo"
//!         }
//!     ],
//!     "hideOnStart": false,
//!     "profileDirName": "StepMania 5",
//!     "scoresDir": "",
//!     "webserver": false
//! }
//! ```
//!
//! # How does serde map the names? (for beginners)
//!
//! `#[serde(rename_all = "camelCase")]` on a struct tells the derived
//! `Serialize`/`Deserialize` impls to turn every field name such as
//! `hide_on_start` into `hideOnStart` in the JSON text.  A single field can
//! override that with `#[serde(rename = "type")]` (needed here because `type`
//! is a Rust keyword), and `#[serde(alias = "...")]` adds extra names that
//! are accepted when reading but never written.
//!
//! `Option<T>` fields combined with `skip_serializing_if = "Option::is_none"`
//! disappear from the file entirely when they are `None`, and
//! `#[serde(default)]` makes a missing key read back as `None`.
//!
//! # Legacy key names
//!
//! Earlier releases wrote snake_case keys (`padmiss_api_url`, `api_key`,
//! `fifo_config`, ...).  Those are accepted on read through `#[serde(alias)]`
//! and rewritten under the camelCase names on the next save.
//!
//! # Rendering
//!
//! [`Configuration::to_pretty_json`] produces the on-disk form: keys sorted
//! lexicographically at every level, four-space indentation, one trailing
//! newline.  The same document always renders to the same bytes, so saved
//! files diff cleanly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use url::Url;

use super::validation::{self, Violation};

/// API endpoint written into a freshly bootstrapped document.
pub const DEFAULT_API_URL: &str = "https://api.padmiss.com/";

/// StepMania profile subdirectory written into a freshly bootstrapped document.
pub const DEFAULT_PROFILE_DIR_NAME: &str = "StepMania 5";

/// `type` tag selecting a USB scanner device.
pub const SCANNER_TYPE: &str = "scanner";

/// `type` tag selecting a named-pipe device.
pub const FIFO_TYPE: &str = "fifo";

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration document stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Base URL of the Padmiss web API.
    #[serde(alias = "padmiss_api_url")]
    pub api_url: Url,
    /// Opaque API credential.  Empty until the user fills it in.
    #[serde(alias = "api_key")]
    pub api_key: String,
    /// Directory score data is read from.
    #[serde(alias = "scores_dir")]
    pub scores_dir: PathBuf,
    /// Directory backups are written to.
    #[serde(alias = "backup_dir")]
    pub backup_dir: PathBuf,
    /// Name of the per-profile data subdirectory.
    #[serde(alias = "profile_dir_name")]
    pub profile_dir_name: String,
    /// Start minimised.
    #[serde(alias = "hide_on_start")]
    pub hide_on_start: bool,
    /// Whether the local web UI is served.  Absent means off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webserver: Option<bool>,
    /// Score-input devices.  Order is significant: callers address devices
    /// by index.
    pub devices: Vec<DeviceConfig>,
}

/// One score-input device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// OS device path or similar identifier.
    pub path: String,
    /// Tag selecting device behaviour, see [`DeviceConfig::kind`].
    #[serde(rename = "type")]
    pub device_type: String,
    /// USB identification, used by scanner devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ScannerConfig>,
    /// Named pipe settings, used by fifo devices.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "fifo_config")]
    pub fifo_config: Option<FifoConfig>,
}

/// Identifies one USB scanner instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerConfig {
    /// USB vendor ID as a hex string, e.g. `"08ff"`.
    #[serde(alias = "id_vendor")]
    pub id_vendor: String,
    /// USB product ID as a hex string.
    #[serde(alias = "id_product")]
    pub id_product: String,
    /// Port on the hub, when several identical scanners are attached.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "port_number")]
    pub port_number: Option<u32>,
    /// USB bus number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus: Option<u32>,
}

/// Named pipe a fifo device reads scores from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FifoConfig {
    pub path: PathBuf,
}

/// Behaviour selected by [`DeviceConfig::device_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// USB scanner, configured through `config`.
    Scanner,
    /// Named pipe, configured through `fifoConfig`.
    Fifo,
    /// A tag this crate does not recognise.  Kept as-is on save.
    Other,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_api_url() -> Url {
    // DEFAULT_API_URL is a compile-time constant and always parses.
    Url::parse(DEFAULT_API_URL).expect("DEFAULT_API_URL is a valid URL")
}

impl Configuration {
    /// The first-run document, with backups stored in `backup_dir`.
    pub fn defaults(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            scores_dir: PathBuf::new(),
            backup_dir: backup_dir.into(),
            profile_dir_name: DEFAULT_PROFILE_DIR_NAME.to_string(),
            hide_on_start: false,
            webserver: Some(false),
            devices: Vec::new(),
        }
    }

    /// Whether the local web UI should be served.
    pub fn webserver_enabled(&self) -> bool {
        self.webserver.unwrap_or(false)
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns every [`Violation`] found: malformed JSON is reported as a
    /// single violation on field `$`, schema problems as one violation per
    /// offending field.
    pub fn from_json_str(text: &str) -> Result<Self, Vec<Violation>> {
        validation::parse_document(text)
    }

    /// Checks the in-memory document against the rules
    /// [`from_json_str`](Self::from_json_str) enforces.  An empty list means
    /// the rendered form will load back.
    ///
    /// # Errors
    ///
    /// Fails only if a path field is not valid UTF-8.
    pub fn violations(&self) -> Result<Vec<Violation>, serde_json::Error> {
        Ok(validation::validate_value(&serde_json::to_value(self)?))
    }

    /// Renders the document in its on-disk form.
    ///
    /// # Errors
    ///
    /// Fails only if a path field is not valid UTF-8.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let value = canonicalize(serde_json::to_value(self)?);

        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)?;
        out.push(b'\n');

        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Rebuilds every object with its keys in lexicographic order.
///
/// `serde_json::Map` is only sorted when the `preserve_order` feature is off;
/// sorting here keeps the output stable whatever else in the build enables it.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(key, value)| (key, canonicalize(value)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

// ── Devices ───────────────────────────────────────────────────────────────────

impl DeviceConfig {
    /// A USB scanner device.
    pub fn scanner(path: impl Into<String>, config: ScannerConfig) -> Self {
        Self {
            path: path.into(),
            device_type: SCANNER_TYPE.to_string(),
            config: Some(config),
            fifo_config: None,
        }
    }

    /// A device fed from the named pipe at `fifo_path`.
    pub fn fifo(path: impl Into<String>, fifo_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            device_type: FIFO_TYPE.to_string(),
            config: None,
            fifo_config: Some(FifoConfig {
                path: fifo_path.into(),
            }),
        }
    }

    /// Classifies the `type` tag.
    pub fn kind(&self) -> DeviceKind {
        match self.device_type.as_str() {
            SCANNER_TYPE => DeviceKind::Scanner,
            FIFO_TYPE => DeviceKind::Fifo,
            _ => DeviceKind::Other,
        }
    }

    /// Describes a mismatch between `type` and the populated sub-config, if
    /// any.
    ///
    /// The loader does not reject such devices; it logs this description.
    pub fn inconsistency(&self) -> Option<String> {
        let has_scanner = self.config.is_some();
        let has_fifo = self.fifo_config.is_some();

        match self.kind() {
            DeviceKind::Scanner if !has_scanner => {
                Some("scanner device has no `config`".to_string())
            }
            DeviceKind::Scanner if has_fifo => {
                Some("scanner device also carries `fifoConfig`".to_string())
            }
            DeviceKind::Fifo if !has_fifo => Some("fifo device has no `fifoConfig`".to_string()),
            DeviceKind::Fifo if has_scanner => {
                Some("fifo device also carries `config`".to_string())
            }
            DeviceKind::Other => Some(format!("unrecognised device type `{}`", self.device_type)),
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
