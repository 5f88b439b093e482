//! Error taxonomy for the cache surface.
//!
//! Transport failures are not errors of the cache surface: for queries they
//! land on the entry, for mutations they come back through
//! [`CacheError::Transport`]. Everything else here is surfaced synchronously
//! at call time.

use thiserror::Error;

use crate::transport::TransportError;

/// Arguments failed to build a valid request descriptor. No request was
/// issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid arguments: {message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(format!("missing required field `{field}`"))
    }
}

/// Synchronous failure of `subscribe` or `mutate`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("no endpoint named `{name}` is registered")]
    UnknownEndpoint { name: String },
    #[error("endpoint `{name}` is not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to serialize call arguments: {message}")]
    Args { message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CacheError {
    pub fn unknown_endpoint(name: impl Into<String>) -> Self {
        Self::UnknownEndpoint { name: name.into() }
    }

    pub fn kind_mismatch(name: impl Into<String>, expected: &'static str) -> Self {
        Self::KindMismatch {
            name: name.into(),
            expected,
        }
    }

    pub fn args(err: impl std::fmt::Display) -> Self {
        Self::Args {
            message: err.to_string(),
        }
    }
}
