//! Transport-level failures (no response received)

use std::time::Duration;

/// Errors where the backend never produced a response.
///
/// Clonable so a single failure can be reported to several waiters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request could not be built: {0}")]
    Build(String),

    #[error("HTTP request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Map a reqwest error, attributing timeouts to the configured limit.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::Build(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
