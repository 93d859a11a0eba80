//! Cached user profile

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The logged-in user as returned by login/registration.
///
/// Only `id` matters to the gateway; every other field is carried through
/// untouched so the stored JSON matches what the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Value,
    #[serde(rename = "firstName", default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn with_id(id: i64) -> Self {
        Self {
            id: Value::from(id),
            first_name: None,
            last_name: None,
            email: None,
            extra: Map::new(),
        }
    }

    /// Numeric id injected into outgoing requests.
    ///
    /// `None` unless the stored id is a JSON integer; strings, floats and
    /// missing ids all skip injection.
    pub fn user_id(&self) -> Option<i64> {
        self.id.as_i64()
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone().unwrap_or_else(|| "unknown user".into()),
        }
    }

    /// Role string, when the backend includes one.
    pub fn role(&self) -> Option<&str> {
        self.extra.get("role").and_then(Value::as_str)
    }
}
