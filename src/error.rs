//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Backend
//! replies are folded into tagged kinds so callers can tell "no such thing"
//! from "the call failed".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl Error {
    /// Map a backend HTTP status plus error message to a tagged kind.
    ///
    /// The hosted API reports failures as `{"message", "code", "type"}`;
    /// the status code is the stable part of that contract.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Error::NotFound(message),
            409 => Error::Conflict(message),
            401 | 403 => Error::Unauthorized(message),
            400 => Error::Validation(message),
            _ => Error::Backend { status, message },
        }
    }

    /// True when the failure is plausibly temporary: transport errors and
    /// 5xx backend replies. Tagged client-side kinds are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) => true,
            Error::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
