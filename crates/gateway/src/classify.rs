//! Failure classification for backend responses
//!
//! Every failed attempt passes through `classify` exactly once, producing an
//! `ApiFailure` the recovery logic can branch on. Token expiry is recognized
//! by the response body, not the status code: the backend reports it with a
//! `message` literal (`"jwt expired"`) and may also send a structured `code`.

use serde_json::Value;
use transport::{RawResponse, StatusCode, TransportError};

use crate::error::{ApiFailure, FailureKind};

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong!";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// The fields of an error body the gateway looks at: `{ message?, code? }`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
}

impl ErrorBody {
    /// Decode leniently, field by field. A body that is not a JSON object is
    /// empty; a field of an unexpected type is absent without hiding the
    /// others. Numeric codes are kept in their decimal form.
    pub fn parse(response: &RawResponse) -> Self {
        let Ok(Value::Object(fields)) = response.json::<Value>() else {
            return Self::default();
        };
        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let code = match fields.get("code") {
            Some(Value::String(code)) => Some(code.clone()),
            Some(Value::Number(code)) => Some(code.to_string()),
            _ => None,
        };
        Self { message, code }
    }
}

/// How the backend says "your access token expired".
///
/// Exact message literals and structured codes are both accepted; either
/// list may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirySignal {
    messages: Vec<String>,
    codes: Vec<String>,
}

impl ExpirySignal {
    pub fn new(messages: Vec<String>, codes: Vec<String>) -> Self {
        Self { messages, codes }
    }

    pub fn matches(&self, body: &ErrorBody) -> bool {
        let by_message = body
            .message
            .as_ref()
            .is_some_and(|m| self.messages.iter().any(|s| s == m));
        let by_code = body
            .code
            .as_ref()
            .is_some_and(|c| self.codes.iter().any(|s| s == c));
        by_message || by_code
    }
}

impl Default for ExpirySignal {
    fn default() -> Self {
        Self::new(vec!["jwt expired".into()], vec!["TOKEN_EXPIRED".into()])
    }
}

/// Split a transport result into success or a classified failure.
pub fn classify(
    outcome: transport::Result<RawResponse>,
    signal: &ExpirySignal,
) -> Result<RawResponse, ApiFailure> {
    let response = match outcome {
        Ok(response) => response,
        Err(err) => return Err(network_failure(&err)),
    };
    if response.is_success() {
        return Ok(response);
    }

    let body = ErrorBody::parse(&response);
    let kind = if signal.matches(&body) {
        FailureKind::Expired
    } else if response.status == StatusCode::UNAUTHORIZED {
        FailureKind::Unauthorized
    } else {
        FailureKind::Server
    };

    Err(ApiFailure {
        kind,
        status: Some(response.status.as_u16()),
        message: body.message,
    })
}

fn network_failure(err: &TransportError) -> ApiFailure {
    ApiFailure {
        kind: FailureKind::Network,
        status: None,
        message: Some(err.to_string()),
    }
}
