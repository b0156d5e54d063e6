//! # Setstore Errors
//!
//! Defines [`Error`], the single error type returned by every settings storage
//! operation, and the [`Result`] alias used across the crate.
//!
//! Construction-time problems (an invalid key prefix, an unknown file format)
//! surface as [`Error::InvalidConfiguration`] or [`Error::UnsupportedFormat`];
//! failures reported by an underlying store during an operation surface as
//! [`Error::Backend`] or [`Error::StorageSystem`] and are never retried.
use std::error::Error as StdError;
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::fs::error::StorageSystemError;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Filesystem provider error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    #[error("Serialization to '{format}' failed: {source}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Deserialization from '{format}' failed: {source}")]
    Deserialization {
        format: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    /// Rejected configuration, e.g. a key prefix containing the reserved separator
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An external store failed while executing an operation
    #[error("Backend '{backend}' failed during '{operation}': {message}")]
    Backend {
        backend: String,
        operation: String,
        message: String,
    },

    /// A backend could not be initialised in the current environment
    #[error("Backend '{0}' is not available")]
    Unavailable(String),
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    pub fn backend(
        backend: impl Into<String>,
        operation: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Error::Backend {
            backend: backend.into(),
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn serialization(
        format: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            format: format.into(),
            source: source.into(),
        }
    }

    pub fn deserialization(
        format: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Error::Deserialization {
            format: format.into(),
            source: source.into(),
        }
    }
}
