//! Raw HTTP seam for the PMS backend
//!
//! Defines the `Transport` trait that decouples the authenticated gateway from
//! the HTTP client. `ReqwestTransport` is the production implementation; the
//! gateway's tests drive the same trait with scripted in-process backends.
//!
//! A transport does exactly one thing: send an already-decorated
//! `OutboundRequest` and hand back whatever came over the wire. It never
//! inspects status codes, never retries and never touches credentials.

pub mod error;
pub mod request;
pub mod reqwest_transport;
pub mod response;

pub use error::{Result, TransportError};
pub use request::{FilePart, MultipartForm, OutboundRequest, RequestBody};
pub use reqwest::header;
pub use reqwest::{Method, StatusCode};
pub use reqwest_transport::{ReqwestTransport, TransportConfig};
pub use response::RawResponse;

use std::future::Future;
use std::pin::Pin;

/// Abstraction over the HTTP client used to reach the backend.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn Transport>`).
pub trait Transport: Send + Sync {
    /// Identifier for logging (e.g. "reqwest").
    fn id(&self) -> &str;

    /// Send one request and return the raw response.
    ///
    /// Non-2xx statuses are a successful transport round trip and come back
    /// as `Ok`. `Err` means no response was received at all.
    fn send<'a>(
        &'a self,
        request: &'a OutboundRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse>> + Send + 'a>>;
}
