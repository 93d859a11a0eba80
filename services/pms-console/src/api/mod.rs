//! Backend endpoints used by the console
//!
//! Thin wrappers over `Gateway`: each function builds one request, sends it
//! through the gateway and unwraps the `{ success, message, data }` envelope.
//! Authentication, retries and user notices all happen in the gateway.

pub mod data_filling;
pub mod employees;
pub mod templates;

use bytes::Bytes;
use serde_json::Value;
use transport::FilePart;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The envelope's `data`, or the body itself when it is not enveloped.
pub fn payload(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// A list payload: a bare array or `{ data: [...] }`. Anything else is empty.
pub fn records(body: Value) -> Vec<Value> {
    match payload(body) {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

/// Escape one path segment (ids, template names).
pub(crate) fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// The spreadsheet part of an upload form.
pub fn spreadsheet(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> FilePart {
    FilePart {
        field: "file".to_string(),
        file_name: file_name.into(),
        content_type: Some(XLSX_CONTENT_TYPE.to_string()),
        bytes: bytes.into(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use gateway::Gateway;
    use session::{CredentialStore, UserProfile};
    use transport::{ReqwestTransport, TransportConfig};
    use wiremock::MockServer;

    /// A logged-in gateway (`at_1`, user 7) talking to `server`.
    pub async fn gateway_for(server: &MockServer) -> Gateway {
        let transport = ReqwestTransport::new(&TransportConfig::new(server.uri())).unwrap();
        let store = Arc::new(CredentialStore::in_memory());
        store.set_token_pair("at_1", "rt_1").await;
        store.set_user(&UserProfile::with_id(7)).await;
        Gateway::new(Arc::new(transport), store)
    }
}
