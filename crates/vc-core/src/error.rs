//! Unified error type for vidcue.
//!
//! Library crates funnel their failures into [`Error`]. Playback failures are
//! not errors in this sense; they are session state (see `vc-resolver`).

use std::fmt;

/// Unified error type covering all failure modes outside the playback state
/// machine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "task", "anime").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The HTTP transport failed before a response was received.
    #[error("HTTP error: {source}")]
    Http {
        /// The underlying transport error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend answered with a failure envelope or status.
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Api {
        /// HTTP status, when the failure came with one.
        status: Option<u16>,
        /// Server-provided error text.
        message: String,
    },

    /// A response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A content-type probe failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Http`].
    pub fn http(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Http {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Api`].
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the backend reported the entity as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::Api { status: Some(404), .. }
        )
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
