//! Custom error types for scholarguard.
//!
//! Identity validation failures are the only errors surfaced to callers of
//! [`crate::assess`]; backend faults are captured as data ([`BackendOutcome`])
//! so a partial assessment is always produced.
//!
//! [`BackendOutcome`]: crate::evidence::BackendOutcome

use thiserror::Error;

/// Main error type for scholarguard operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Bad input identity (empty name, unparseable request)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Snapshot/response parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `GuardError`
pub type Result<T> = std::result::Result<T, GuardError>;

/// Fault raised by a backend's `lookup` for genuine fault conditions only.
///
/// "Not found" is `Ok(None)`, never an error. The dispatcher converts each
/// variant into a [`BackendErrorKind`] on the outcome; nothing past the
/// dispatcher ever sees this type.
///
/// [`BackendErrorKind`]: crate::evidence::BackendErrorKind
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend exceeded its per-call deadline
    #[error("backend timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Underlying store/service could not be reached
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Store/service answered with data the backend cannot interpret
    #[error("malformed backend data: {0}")]
    MalformedData(String),
}
