//! In-process fakes shared by the gateway tests

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use session::{CredentialStore, UserProfile};
use transport::{OutboundRequest, RawResponse, StatusCode, Transport};

use crate::gateway::Gateway;
use crate::notify::{Navigator, Notice, Notifier};

type Handler = Box<dyn Fn(&OutboundRequest) -> transport::Result<RawResponse> + Send + Sync>;

/// Transport answering from a closure; records every request it sees.
///
/// Requests to the refresh endpoint can be delayed so concurrent callers
/// pile up behind a refresh in flight.
pub struct ScriptedTransport {
    handler: Handler,
    refresh_delay: Duration,
    log: Mutex<Vec<OutboundRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&OutboundRequest) -> transport::Result<RawResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            refresh_delay: Duration::ZERO,
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<OutboundRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> &str {
        "scripted"
    }

    fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> Pin<Box<dyn Future<Output = transport::Result<RawResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.log.lock().unwrap().push(request.clone());
            if request.path == session::REFRESH_TOKEN_PATH && !self.refresh_delay.is_zero() {
                tokio::time::sleep(self.refresh_delay).await;
            }
            (self.handler)(request)
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<usize>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        *self.redirects.lock().unwrap()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_entry(&self) {
        *self.redirects.lock().unwrap() += 1;
    }
}

/// A gateway over an in-memory store, wired to recording side channels.
pub struct Harness {
    pub gateway: Arc<Gateway>,
    pub transport: Arc<ScriptedTransport>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub async fn new(transport: ScriptedTransport) -> Self {
        let transport = Arc::new(transport);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let gateway = Gateway::new(transport.clone(), Arc::new(CredentialStore::in_memory()))
            .with_notifier(notifier.clone())
            .with_navigator(navigator.clone());
        Self {
            gateway: Arc::new(gateway),
            transport,
            notifier,
            navigator,
        }
    }

    /// Seed the store as if a login had succeeded.
    pub async fn login_as(&self, access: &str, refresh: &str, user_id: i64) {
        let store = self.gateway.credential_store();
        store.set_token_pair(access, refresh).await;
        store.set_user(&UserProfile::with_id(user_id)).await;
    }
}

pub fn ok(body: Value) -> transport::Result<RawResponse> {
    Ok(RawResponse::json_body(StatusCode::OK, &body))
}

/// The backend's expired-token reply.
pub fn expired(status: StatusCode) -> transport::Result<RawResponse> {
    Ok(RawResponse::json_body(status, &json!({"message": "jwt expired"})))
}

pub fn refreshed(access: &str, refresh: &str) -> transport::Result<RawResponse> {
    ok(json!({"accessToken": access, "refreshToken": refresh}))
}
