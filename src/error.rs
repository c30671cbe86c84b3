//! Unified error types for the record vault.

use thiserror::Error;

/// Unified error type for the record vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Storage backend error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend errors.
///
/// A missing entity is not an error at this layer; point reads return
/// `Ok(None)` and the API layer decides what "not found" means.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The project key is missing or malformed.
    #[error("invalid project key: {0}")]
    InvalidProjectKey(String),

    /// The backend answered with a non-success status.
    #[error("store request failed with status {status}: {detail}")]
    RequestFailed {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Response body or reason text.
        detail: String,
    },

    /// The backend answered with a body we could not interpret.
    #[error("malformed store response: {0}")]
    InvalidResponse(String),

    /// Transport-level failure talking to the backend.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, VaultError>;
