//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `kustomize-overlay` library. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers every failure an assembly can hit,
//! with enough context (field names, paths, roots) to trace a failure back to
//! the input that caused it.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors. Each
//!   variant corresponds to one stage of an assembly:
//!   - Malformed YAML in the kustomization document or a fragment.
//!   - A `patchesJson6902` entry without its `path` key.
//!   - A reference string that can neither be loaded nor read as inline YAML.
//!   - A failure reported by the resolution engine.
//!   - Scratch directory and file write failures.
//!   - Reads of paths that no filesystem delegate holds.
//!   - Invalid configuration records.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! There is no degraded mode: every error aborts the assembly and a partial
//! manifest set is never returned.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for kustomize-overlay operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed YAML in the kustomization document or in a fragment.
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// A `patchesJson6902` entry does not carry the required `path` key.
    ///
    /// `entry` holds the offending entry rendered as YAML.
    #[error("Malformed patch in {field}: entry does not contain 'path' ({entry})")]
    MalformedPatch { field: String, entry: String },

    /// A string fragment looks like a path but cannot be loaded.
    #[error("Unresolvable reference in {field}: '{reference}' is neither loadable nor inline YAML")]
    UnresolvableReference { field: String, reference: String },

    /// The resolution engine failed for the given root.
    #[error("Kustomize build for path '{}' failed: {message}", root.display())]
    Resolution { root: PathBuf, message: String },

    /// A filesystem operation failed.
    #[error("Filesystem error during {operation} on '{}': {message}", path.display())]
    Filesystem {
        operation: String,
        path: PathBuf,
        message: String,
    },

    /// Neither filesystem delegate holds the requested path.
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The configuration record is invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the record
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

impl Error {
    pub(crate) fn filesystem(
        operation: &str,
        path: impl Into<PathBuf>,
        message: impl ToString,
    ) -> Self {
        Error::Filesystem {
            operation: operation.to_string(),
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        Error::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
