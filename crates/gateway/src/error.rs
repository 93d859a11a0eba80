//! Error types for gateway operations

use std::fmt;

use session::RefreshError;

use crate::classify::{GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE};

/// Classified reason a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Backend says the access token expired
    Expired,
    /// 401 without the expiry signal
    Unauthorized,
    /// Any other non-2xx response
    Server,
    /// No response at all (timeout, DNS, refused, offline)
    Network,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Expired => "expired",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Server => "server_error",
            FailureKind::Network => "network_error",
        }
    }
}

/// A failed request after the single classification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub kind: FailureKind,
    /// HTTP status, `None` for network failures
    pub status: Option<u16>,
    /// Server-supplied `message`, or the transport error text
    pub message: Option<String>,
}

impl ApiFailure {
    /// Text shown to the user for this failure.
    pub fn notice_message(&self) -> &str {
        match self.kind {
            FailureKind::Network => NETWORK_ERROR_MESSAGE,
            _ => self
                .message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(GENERIC_ERROR_MESSAGE),
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, &self.message) {
            (Some(status), Some(message)) => {
                write!(f, "{} ({status}): {message}", self.kind.label())
            }
            (Some(status), None) => write!(f, "{} ({status})", self.kind.label()),
            (None, Some(message)) => write!(f, "{}: {message}", self.kind.label()),
            (None, None) => f.write_str(self.kind.label()),
        }
    }
}

impl std::error::Error for ApiFailure {}

/// Errors from gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Api(ApiFailure),

    #[error("session expired: {0}")]
    SessionExpired(#[from] RefreshError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Error {
    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Error::Api(failure) => Some(failure),
            _ => None,
        }
    }

    /// Server message when there is one, otherwise `fallback`.
    ///
    /// Mirrors how login/registration report errors: the backend's reason
    /// wins, a fixed sentence covers everything else.
    pub fn message_or(&self, fallback: &str) -> String {
        self.failure()
            .filter(|f| f.kind != FailureKind::Network)
            .and_then(|f| f.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: FailureKind, status: Option<u16>, message: Option<&str>) -> ApiFailure {
        ApiFailure {
            kind,
            status,
            message: message.map(String::from),
        }
    }

    #[test]
    fn notice_prefers_server_message() {
        let f = failure(FailureKind::Server, Some(422), Some("Template not found"));
        assert_eq!(f.notice_message(), "Template not found");
    }

    #[test]
    fn notice_falls_back_to_generic() {
        assert_eq!(
            failure(FailureKind::Server, Some(500), None).notice_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            failure(FailureKind::Server, Some(500), Some("")).notice_message(),
            GENERIC_ERROR_MESSAGE
        );
    }

    #[test]
    fn network_notice_ignores_transport_text() {
        let f = failure(FailureKind::Network, None, Some("dns error: no such host"));
        assert_eq!(f.notice_message(), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn display_includes_kind_status_and_message() {
        let f = failure(FailureKind::Unauthorized, Some(401), Some("not logged in"));
        assert_eq!(f.to_string(), "unauthorized (401): not logged in");
        let err = Error::Api(f);
        assert_eq!(err.to_string(), "request failed: unauthorized (401): not logged in");
    }

    #[test]
    fn message_or_uses_fallback_without_server_message() {
        let with = Error::Api(failure(FailureKind::Server, Some(400), Some("Email taken")));
        assert_eq!(with.message_or("Registration failed."), "Email taken");

        let network = Error::Api(failure(FailureKind::Network, None, Some("refused")));
        assert_eq!(network.message_or("Login failed."), "Login failed.");

        let session = Error::SessionExpired(RefreshError::MissingRefreshToken);
        assert_eq!(session.message_or("Login failed."), "Login failed.");
    }
}
