//! # Veil Error Types
//!
//! Errors that can surface from the fib engine.
//!
//! Resolution never produces one of these: a failed resolution falls back to
//! the authoritative state. Errors come from the save/load boundary and from
//! configuration.

use thiserror::Error;
use veil_shared::CellKind;

/// Errors that can occur in the fib engine.
#[derive(Error, Debug)]
pub enum VeilError {
    /// A persisted kind identifier is not known to the host registry.
    ///
    /// Either the save is corrupt or a kind's provider was removed. Loading
    /// must not continue as if the entry were never there.
    #[error("unknown cell kind identifier in tracking document: {id:?}")]
    UnknownKind {
        /// The identifier that failed to resolve.
        id: String,
    },

    /// A tracked kind has no identifier in the host registry, so it cannot be saved.
    #[error("cell kind {0} has no registry identifier")]
    UnnamedKind(CellKind),

    /// The namespaced document has no entry under the save key.
    #[error("tracking document has no {key:?} entry")]
    MissingNamespace {
        /// The configured save key.
        key: String,
    },

    /// The document is not a map of identifier to position array.
    #[error("malformed tracking document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for fib engine operations.
pub type VeilResult<T> = Result<T, VeilError>;
