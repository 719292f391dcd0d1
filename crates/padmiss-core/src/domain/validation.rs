//! Structural validation of the configuration document.
//!
//! Validation runs over the raw [`serde_json::Value`] before any typed
//! deserialization happens.  That way every problem in the file is reported
//! at once, each as a [`Violation`] naming the field by a JSON-path-like
//! string (`devices[1].config.idVendor`) and saying what is wrong with it.
//! Only a document with no violations is handed to `serde` for conversion to
//! [`Configuration`].
//!
//! # Why not just `serde_json::from_str::<Configuration>`? (for beginners)
//!
//! Typed deserialization stops at the first problem and its message names a
//! line and column, not a setting.  Walking the untyped
//! [`serde_json::Value`] tree first lets the loader list every bad field by
//! name, in the spelling the file actually uses (legacy snake_case keys are
//! reported as written).
//!
//! Unknown keys are ignored.  The `type` / `config` / `fifoConfig` agreement
//! of a device is not checked here; see [`DeviceConfig::inconsistency`].
//!
//! [`DeviceConfig::inconsistency`]: super::config::DeviceConfig::inconsistency

use std::fmt;

use serde_json::{Map, Value};
use url::Url;

use super::config::Configuration;

/// Field name used for problems with the document as a whole.
pub const ROOT_FIELD: &str = "$";

/// One problem found in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the offending field, e.g. `devices[0].fifoConfig.path`.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Parses `text` as JSON, validates it and converts it to a [`Configuration`].
///
/// # Errors
///
/// Returns all violations found.  Malformed JSON yields exactly one, on
/// [`ROOT_FIELD`].
pub fn parse_document(text: &str) -> Result<Configuration, Vec<Violation>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| vec![Violation::new(ROOT_FIELD, format!("malformed JSON: {e}"))])?;

    let violations = validate_value(&value);
    if !violations.is_empty() {
        return Err(violations);
    }

    serde_json::from_value(value).map_err(|e| vec![Violation::new(ROOT_FIELD, e.to_string())])
}

/// Checks a parsed JSON value against the document schema.
///
/// Returns an empty list when the value is a valid document.
pub fn validate_value(value: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    match value.as_object() {
        Some(root) => validate_root(root, &mut violations),
        None => violations.push(Violation::new(
            ROOT_FIELD,
            format!("expected an object, found {}", type_name(value)),
        )),
    }
    violations
}

/// Parses an API base URL.
///
/// The URL must be absolute, use `http` or `https`, and name a host.
///
/// # Errors
///
/// Returns a human-readable reason when the URL is rejected.
pub fn check_api_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL `{raw}`: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "unsupported URL scheme `{}`, expected http or https",
            url.scheme()
        ));
    }
    if !url.has_host() {
        return Err(format!("URL `{raw}` has no host"));
    }
    Ok(url)
}

// ── Document walk ─────────────────────────────────────────────────────────────

fn validate_root(root: &Map<String, Value>, violations: &mut Vec<Violation>) {
    let mut fields = Fields::new(String::new(), root, violations);

    if let Some((key, raw)) = fields.required_str("apiUrl", Some("padmiss_api_url")) {
        if let Err(reason) = check_api_url(raw) {
            fields.push(key, reason);
        }
    }
    fields.required_str("apiKey", Some("api_key"));
    fields.required_str("scoresDir", Some("scores_dir"));
    fields.required_str("backupDir", Some("backup_dir"));
    fields.required_str("profileDirName", Some("profile_dir_name"));
    fields.required_bool("hideOnStart", Some("hide_on_start"));
    fields.optional_bool("webserver", None);

    if let Some(devices) = fields.required_array("devices", None) {
        for (index, device) in devices.iter().enumerate() {
            let prefix = format!("devices[{index}]");
            match device.as_object() {
                Some(object) => validate_device(prefix, object, fields.violations),
                None => fields.violations.push(Violation::new(
                    prefix,
                    format!("expected an object, found {}", type_name(device)),
                )),
            }
        }
    }
}

fn validate_device(
    prefix: String,
    device: &Map<String, Value>,
    violations: &mut Vec<Violation>,
) {
    let mut fields = Fields::new(prefix, device, violations);

    fields.required_str("path", None);
    fields.required_str("type", None);

    if let Some((_, scanner)) = fields.optional_object("config", None) {
        let prefix = fields.path("config");
        validate_scanner(prefix, scanner, fields.violations);
    }
    if let Some((key, fifo)) = fields.optional_object("fifoConfig", Some("fifo_config")) {
        let prefix = fields.path(key);
        let mut fifo_fields = Fields::new(prefix, fifo, fields.violations);
        fifo_fields.required_str("path", None);
    }
}

fn validate_scanner(
    prefix: String,
    scanner: &Map<String, Value>,
    violations: &mut Vec<Violation>,
) {
    let mut fields = Fields::new(prefix, scanner, violations);

    fields.required_str("idVendor", Some("id_vendor"));
    fields.required_str("idProduct", Some("id_product"));
    fields.optional_u32("portNumber", Some("port_number"));
    fields.optional_u32("bus", None);
}

// ── Field checks ──────────────────────────────────────────────────────────────

/// Field lookups on one JSON object, recording violations as they are found.
struct Fields<'a, 'v> {
    prefix: String,
    object: &'v Map<String, Value>,
    violations: &'a mut Vec<Violation>,
}

impl<'a, 'v> Fields<'a, 'v> {
    fn new(
        prefix: String,
        object: &'v Map<String, Value>,
        violations: &'a mut Vec<Violation>,
    ) -> Self {
        Self {
            prefix,
            object,
            violations,
        }
    }

    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.prefix)
        }
    }

    fn push(&mut self, key: &str, reason: impl Into<String>) {
        let field = self.path(key);
        self.violations.push(Violation::new(field, reason));
    }

    fn mismatch(&mut self, key: &str, expected: &str, found: &Value) {
        self.push(key, format!("expected {expected}, found {}", type_name(found)));
    }

    /// Looks `key` up, falling back to its legacy spelling, and returns the
    /// spelling found with the value.  Both spellings at once is a violation.
    fn lookup<'k>(
        &mut self,
        key: &'k str,
        legacy: Option<&'k str>,
    ) -> Option<(&'k str, &'v Value)> {
        let object: &'v Map<String, Value> = self.object;
        let current = object.get(key);
        let old = legacy.and_then(|name| object.get(name).map(|value| (name, value)));

        match (current, old) {
            (Some(value), Some((name, _))) => {
                self.push(key, format!("also given under legacy name `{name}`"));
                Some((key, value))
            }
            (Some(value), None) => Some((key, value)),
            (None, Some(found)) => Some(found),
            (None, None) => None,
        }
    }

    fn required<'k>(
        &mut self,
        key: &'k str,
        legacy: Option<&'k str>,
    ) -> Option<(&'k str, &'v Value)> {
        let found = self.lookup(key, legacy);
        if found.is_none() {
            self.push(key, "field required");
        }
        found
    }

    fn required_str<'k>(
        &mut self,
        key: &'k str,
        legacy: Option<&'k str>,
    ) -> Option<(&'k str, &'v str)> {
        let (name, value) = self.required(key, legacy)?;
        match value.as_str() {
            Some(text) => Some((name, text)),
            None => {
                self.mismatch(name, "a string", value);
                None
            }
        }
    }

    fn required_bool(&mut self, key: &str, legacy: Option<&str>) {
        if let Some((name, value)) = self.required(key, legacy) {
            if !value.is_boolean() {
                self.mismatch(name, "a boolean", value);
            }
        }
    }

    fn required_array(&mut self, key: &str, legacy: Option<&str>) -> Option<&'v Vec<Value>> {
        let (name, value) = self.required(key, legacy)?;
        match value.as_array() {
            Some(items) => Some(items),
            None => {
                self.mismatch(name, "an array", value);
                None
            }
        }
    }

    /// Absent and `null` are both accepted.
    fn optional_bool(&mut self, key: &str, legacy: Option<&str>) {
        match self.lookup(key, legacy) {
            None | Some((_, Value::Null)) | Some((_, Value::Bool(_))) => {}
            Some((name, value)) => self.mismatch(name, "a boolean", value),
        }
    }

    fn optional_u32(&mut self, key: &str, legacy: Option<&str>) {
        let (name, value) = match self.lookup(key, legacy) {
            None | Some((_, Value::Null)) => return,
            Some(found) => found,
        };
        match value.as_u64() {
            Some(n) if n <= u64::from(u32::MAX) => {}
            Some(n) => self.push(name, format!("{n} is out of range")),
            None => self.mismatch(name, "a non-negative integer", value),
        }
    }

    fn optional_object<'k>(
        &mut self,
        key: &'k str,
        legacy: Option<&'k str>,
    ) -> Option<(&'k str, &'v Map<String, Value>)> {
        match self.lookup(key, legacy)? {
            (_, Value::Null) => None,
            (name, Value::Object(object)) => Some((name, object)),
            (name, value) => {
                self.mismatch(name, "an object", value);
                None
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
