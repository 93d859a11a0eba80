//! Error types for session storage and token refresh

/// Errors from loading the credential file at startup.
///
/// Runtime get/set/clear never fail; persistence problems after startup are
/// logged instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Why a token refresh did not produce a new access token.
///
/// Clonable: the one outcome of a refresh is handed to every request that
/// was queued behind it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("no refresh token available")]
    MissingRefreshToken,

    #[error("refresh token rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("refresh request failed: {0}")]
    Network(String),

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("refresh abandoned before completion")]
    Abandoned,
}

pub type Result<T> = std::result::Result<T, Error>;
