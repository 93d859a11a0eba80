//! Auth endpoint wire types and the raw refresh call
//!
//! Login and registration go through the gateway like any other request; only
//! their payload shapes live here. The refresh call is different: it is sent
//! straight to the transport so an expired refresh can never trigger another
//! refresh.

use common::Secret;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;
use transport::{OutboundRequest, Transport};

use crate::constants::REFRESH_TOKEN_PATH;
use crate::error::RefreshError;
use crate::profile::UserProfile;

/// Standard backend envelope: `{ success, message, data }`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

#[derive(Debug, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredentials {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Secret<String>,
}

/// `data` of a successful login or registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Body of a successful refresh. Some deployments also echo the user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Exchange a refresh token for a new access/refresh pair.
///
/// `POST /auth/refresh-token` with `{ "refreshToken": ... }`. Does not touch
/// the credential store; persisting the result is the caller's job.
pub async fn refresh_tokens(
    transport: &dyn Transport,
    refresh_token: &Secret<String>,
) -> Result<RefreshResponse, RefreshError> {
    let request = OutboundRequest::post(REFRESH_TOKEN_PATH)
        .with_json(json!({ "refreshToken": refresh_token }));

    let response = transport
        .send(&request)
        .await
        .map_err(|e| RefreshError::Network(e.to_string()))?;

    if !response.is_success() {
        let message = response
            .json::<Value>()
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from))
            .unwrap_or_else(|| response.text_lossy());
        return Err(RefreshError::Rejected {
            status: response.status.as_u16(),
            message,
        });
    }

    let refreshed = response
        .json::<RefreshResponse>()
        .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
    if refreshed.access_token.is_empty() || refreshed.refresh_token.is_empty() {
        return Err(RefreshError::InvalidResponse(
            "refresh response carried an empty token".into(),
        ));
    }
    debug!(via = transport.id(), "refresh endpoint issued a new token pair");
    Ok(refreshed)
}
