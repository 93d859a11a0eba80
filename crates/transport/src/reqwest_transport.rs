//! reqwest-backed transport
//!
//! Applies the process-wide base URL, the single fixed timeout and the default
//! `Content-Type`/`Accept: application/json` headers. Headers set on the
//! request win over the defaults; multipart bodies always carry their own
//! boundary content type.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::request::{MultipartForm, OutboundRequest, RequestBody};
use crate::response::RawResponse;
use crate::Transport;

/// Default request timeout applied to every call, refresh included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connection settings read once at startup.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Production transport over a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers())
            .build()
            .map_err(|e| TransportError::Build(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn execute(&self, request: &OutboundRequest) -> Result<RawResponse> {
        let url = self.url(&request.path);
        let mut headers = request.headers.clone();

        let mut builder = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder.headers(headers),
            RequestBody::Json(value) => builder.headers(headers).json(value),
            RequestBody::Multipart(form) => {
                // reqwest appends its own boundary content type
                headers.remove(CONTENT_TYPE);
                builder.headers(headers).multipart(build_form(form)?)
            }
        };

        debug!(method = %request.method, url = %url, "sending request");

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout))?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    fn id(&self) -> &str {
        "reqwest"
    }

    fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>> {
        Box::pin(self.execute(request))
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn build_form(form: &MultipartForm) -> Result<Form> {
    let mut out = Form::new();
    for (name, value) in &form.fields {
        out = out.text(name.clone(), value.clone());
    }
    for file in &form.files {
        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| TransportError::Build(format!("invalid content type: {e}")))?;
        }
        out = out.part(file.field.clone(), part);
    }
    Ok(out)
}
