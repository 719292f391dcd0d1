//! The configuration document and the rules it must satisfy.
//!
//! Nothing in this module touches the file system.  Types here can be built,
//! validated and rendered to JSON entirely in memory, which is what the unit
//! tests do.

/// Document types, defaults and the canonical JSON rendering.
pub mod config;

/// Key/value editing of the document's scalar settings.
pub mod settings;

/// Structural validation of raw JSON into a typed document.
pub mod validation;
