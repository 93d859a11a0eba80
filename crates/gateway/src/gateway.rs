//! The authenticated request gateway
//!
//! Every backend call from the application goes through [`Gateway::send`]:
//! the descriptor is decorated with the current credentials, sent, and the
//! outcome classified. An expired access token is refreshed (once, shared by
//! every request that hit the expiry at the same time) and the request
//! replayed; other failures end the session or notify the user, then reject.

use std::sync::Arc;

use common::Secret;
use serde::de::DeserializeOwned;
use session::{CredentialStore, RefreshError};
use tracing::{Instrument, debug, info, info_span, warn};
use transport::header::{AUTHORIZATION, HeaderValue};
use transport::{OutboundRequest, RawResponse, Transport};
use uuid::Uuid;

use crate::classify::{ExpirySignal, SESSION_EXPIRED_MESSAGE, classify};
use crate::coordinator::{RefreshCoordinator, Ticket};
use crate::decorate::{Decoration, decorate};
use crate::error::{ApiFailure, Error, FailureKind, Result};
use crate::metrics;
use crate::notify::{Navigator, Notice, Notifier, TracingNavigator, TracingNotifier};

/// A caller's request as captured by the gateway, plus its retry marker.
struct PendingRequest {
    id: Uuid,
    request: OutboundRequest,
    retried: bool,
}

impl PendingRequest {
    fn new(request: OutboundRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            retried: false,
        }
    }

    /// Point the descriptor at a freshly issued access token for the replay.
    fn authorize(&mut self, token: &Secret<String>) -> Result<()> {
        let mut value = HeaderValue::from_str(&token.bearer()).map_err(|_| {
            Error::InvalidResponse("refreshed access token is not a valid header value".into())
        })?;
        value.set_sensitive(true);
        self.request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

pub struct Gateway {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    coordinator: RefreshCoordinator,
    expiry: ExpirySignal,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<CredentialStore>) -> Self {
        Self {
            transport,
            store,
            coordinator: RefreshCoordinator::new(),
            expiry: ExpirySignal::default(),
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(TracingNavigator),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn with_expiry_signal(mut self, expiry: ExpirySignal) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send a request and return the settled outcome.
    ///
    /// A response is only ever returned for a 2xx status. Expired tokens are
    /// recovered transparently; every other failure is rejected after its
    /// side effects (notice, or credential wipe and navigation) have run.
    pub async fn send(&self, request: OutboundRequest) -> Result<RawResponse> {
        let pending = PendingRequest::new(request);
        let span = info_span!(
            "gateway_request",
            request_id = %pending.id,
            method = %pending.request.method,
            path = %pending.request.path,
        );
        let result = self.drive(pending).instrument(span).await;
        metrics::record_request(match &result {
            Ok(_) => "success",
            Err(Error::Api(failure)) => failure.kind.label(),
            Err(Error::SessionExpired(_)) => "session_expired",
            Err(_) => "invalid",
        });
        result
    }

    /// Send and decode a 2xx JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json()
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    async fn drive(&self, mut pending: PendingRequest) -> Result<RawResponse> {
        loop {
            let outbound = self.prepare(&pending.request).await;
            let outcome = self.transport.send(&outbound).await;
            let sent_with = outbound.headers.get(AUTHORIZATION).cloned();
            match classify(outcome, &self.expiry) {
                Ok(response) => {
                    debug!(
                        status = response.status.as_u16(),
                        retried = pending.retried,
                        "request succeeded"
                    );
                    return Ok(response);
                }
                Err(failure) => {
                    let token = self.recover(&mut pending, sent_with, failure).await?;
                    pending.authorize(&token)?;
                    debug!("replaying request with refreshed token");
                }
            }
        }
    }

    /// Decorate one attempt with whatever the store holds right now.
    async fn prepare(&self, request: &OutboundRequest) -> OutboundRequest {
        let access_token = self.store.access_token().await;
        let user_id = self.store.user().await.and_then(|user| user.user_id());
        decorate(
            request,
            Decoration {
                access_token: access_token.as_deref(),
                user_id,
            },
        )
    }

    /// Decide what a classified failure means for this request.
    ///
    /// `Ok(token)` asks the caller to replay with `token`; every `Err` is the
    /// request's final outcome. `sent_with` is the `Authorization` value the
    /// failed attempt carried.
    async fn recover(
        &self,
        pending: &mut PendingRequest,
        sent_with: Option<HeaderValue>,
        failure: ApiFailure,
    ) -> Result<Secret<String>> {
        match failure.kind {
            FailureKind::Expired if !pending.retried => {
                pending.retried = true;
                if let Some(token) = self.newer_token(sent_with.as_ref()).await {
                    debug!("access token was refreshed while the request was in flight");
                    return Ok(token);
                }
                info!("access token expired, refreshing");
                Ok(self.refresh_access_token().await?)
            }
            FailureKind::Unauthorized => {
                warn!(status = ?failure.status, "request unauthenticated, ending session");
                self.end_session().await;
                Err(Error::Api(failure))
            }
            FailureKind::Expired if failure.status == Some(401) => {
                warn!("token still expired after refresh, ending session");
                self.end_session().await;
                Err(Error::Api(failure))
            }
            _ => {
                warn!(
                    kind = failure.kind.label(),
                    status = ?failure.status,
                    server_message = ?failure.message,
                    "request failed"
                );
                self.notifier
                    .notify(Notice::error(failure.notice_message()));
                Err(Error::Api(failure))
            }
        }
    }

    /// The stored access token, if it is not the one the attempt was sent with.
    async fn newer_token(&self, sent_with: Option<&HeaderValue>) -> Option<Secret<String>> {
        let sent_with = sent_with?;
        let current = Secret::new(self.store.access_token().await?);
        (sent_with.as_bytes() != current.bearer().as_bytes()).then_some(current)
    }

    /// Obtain a fresh access token, leading the refresh or waiting for the
    /// one in flight.
    pub(crate) async fn refresh_access_token(&self) -> std::result::Result<Secret<String>, RefreshError> {
        let lease = match self.coordinator.begin_or_join() {
            Ticket::Follower(waiter) => {
                debug!("waiting for in-flight refresh");
                return waiter.wait().await;
            }
            Ticket::Leader(lease) => lease,
        };

        let outcome = self.perform_refresh().await;
        metrics::record_refresh(outcome.is_ok());
        match &outcome {
            Ok(_) => {
                info!("access token refreshed");
                lease.settle(outcome.clone());
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed, ending session");
                self.store.clear_tokens().await;
                lease.settle(outcome.clone());
                self.notifier.notify(Notice::error(SESSION_EXPIRED_MESSAGE));
                self.navigator.redirect_to_entry();
            }
        }
        outcome
    }

    /// Call the refresh endpoint directly on the transport and persist the
    /// new pair.
    async fn perform_refresh(&self) -> std::result::Result<Secret<String>, RefreshError> {
        let refresh_token = self
            .store
            .refresh_token()
            .await
            .ok_or(RefreshError::MissingRefreshToken)?;
        let refreshed =
            session::refresh_tokens(self.transport.as_ref(), &Secret::new(refresh_token)).await?;

        self.store
            .set_token_pair(&refreshed.access_token, &refreshed.refresh_token)
            .await;
        if let Some(user) = &refreshed.user {
            self.store.set_user(user).await;
        }
        Ok(Secret::new(refreshed.access_token))
    }

    /// Wipe the credential bundle and send the user back to the entry route.
    pub(crate) async fn end_session(&self) {
        self.store.clear_tokens().await;
        self.navigator.redirect_to_entry();
    }
}
