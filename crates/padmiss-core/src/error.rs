//! Error type for configuration file operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::validation::Violation;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory (is {} set?)", crate::storage::paths::BASE_DIR_ENV)]
    NoPlatformConfigDir,

    /// An explicitly supplied config file does not exist.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// The file is not valid JSON or does not match the document schema.
    #[error("invalid config at {path}: {}", join_violations(.violations))]
    Validation {
        path: PathBuf,
        violations: Vec<Violation>,
    },

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized to JSON.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Coarse classification of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The base directory could not be resolved from the environment.
    Environment,
    /// The config file does not exist.
    NotFound,
    /// Malformed JSON or a schema violation.
    Validation,
    /// Directory creation, read or write failed.
    Io,
    /// The in-memory document could not be rendered.
    Serialize,
}

impl ConfigError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoPlatformConfigDir => ErrorKind::Environment,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Io { .. } => ErrorKind::Io,
            Self::Serialize(_) => ErrorKind::Serialize,
        }
    }

    /// The schema violations carried by a [`ConfigError::Validation`], or an
    /// empty slice for every other variant.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
