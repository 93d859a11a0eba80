//! Session lifecycle on top of the gateway
//!
//! Login and registration are ordinary gateway requests whose success body
//! seeds the credential store. Logout only touches local state.

use serde::Serialize;
use session::{
    ApiEnvelope, LOGIN_PATH, LoginCredentials, REGISTER_PATH, RegisterCredentials, SessionGrant,
    UserProfile,
};
use tracing::info;
use transport::{OutboundRequest, RawResponse};

use crate::error::{ApiFailure, Error, FailureKind, Result};
use crate::gateway::Gateway;

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";
pub const REGISTER_FAILED_MESSAGE: &str = "Registration failed. Please try again.";

/// What the application knows about the session at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub user: Option<UserProfile>,
    /// An access token is stored
    pub authenticated: bool,
}

impl Gateway {
    /// Authenticate and store the issued credentials.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<UserProfile> {
        let grant = self.open_session(LOGIN_PATH, credentials).await?;
        info!(email = %credentials.email, "logged in");
        Ok(grant)
    }

    /// Create an account; the backend logs the new user in directly.
    pub async fn register(&self, credentials: &RegisterCredentials) -> Result<UserProfile> {
        let grant = self.open_session(REGISTER_PATH, credentials).await?;
        info!(email = %credentials.email, "registered");
        Ok(grant)
    }

    /// Refresh the access token now, joining a refresh already in flight.
    pub async fn refresh(&self) -> Result<()> {
        self.refresh_access_token().await?;
        Ok(())
    }

    /// Forget every stored credential.
    pub async fn logout(&self) {
        self.credential_store().clear_tokens().await;
        info!("logged out");
    }

    pub async fn current_session(&self) -> SessionSnapshot {
        let store = self.credential_store();
        SessionSnapshot {
            user: store.user().await,
            authenticated: store.access_token().await.is_some(),
        }
    }

    async fn open_session(&self, path: &str, credentials: &impl Serialize) -> Result<UserProfile> {
        let body = serde_json::to_value(credentials)
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;
        let response = self
            .send(OutboundRequest::post(path).with_json(body))
            .await?;
        let grant = parse_grant(&response)?;

        let store = self.credential_store();
        store
            .set_token_pair(&grant.access_token, &grant.refresh_token)
            .await;
        store.set_user(&grant.user).await;
        if let Some(id_token) = grant.id_token.as_deref().filter(|t| !t.is_empty()) {
            store.set_id_token(id_token).await;
        }
        Ok(grant.user)
    }
}

/// Decode the `{ success, message, data }` envelope of a login/registration.
///
/// A 2xx reply with `success: false` is still a failure, carrying the
/// envelope's message.
fn parse_grant(response: &RawResponse) -> Result<SessionGrant> {
    let envelope: ApiEnvelope<Option<SessionGrant>> = response
        .json()
        .map_err(|e| Error::InvalidResponse(e.to_string()))?;
    match envelope {
        ApiEnvelope {
            success: true,
            data: Some(grant),
            ..
        } if !grant.access_token.is_empty() && !grant.refresh_token.is_empty() => Ok(grant),
        ApiEnvelope { message, .. } => Err(Error::Api(ApiFailure {
            kind: FailureKind::Server,
            status: Some(response.status.as_u16()),
            message,
        })),
    }
}
