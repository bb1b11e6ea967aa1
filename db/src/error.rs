//! Error types for definition, configuration, and manifest handling.
//!
//! Provides a unified error type covering I/O, serialization, invalid
//! definitions, and manifest validation.

use fts_schema_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading definitions or manifests.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A definition failed validation.
    #[error("invalid definition: {0}")]
    ConfigError(#[from] ConfigError),

    /// A definition file could not be parsed.
    #[error("invalid definition file {path}: {reason}")]
    InvalidDefinition {
        /// File that failed to parse.
        path: String,
        /// Parser message.
        reason: String,
    },

    /// Two definitions declare the same table name.
    #[error("duplicate definition for table '{0}'")]
    DuplicateDefinition(String),

    /// Manifest validation failure (e.g., malformed checksum).
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// All configured loader sources failed.
    #[error("no definition sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
