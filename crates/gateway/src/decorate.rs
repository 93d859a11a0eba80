//! Outbound request decoration
//!
//! Builds the request actually sent for one attempt from the caller's
//! descriptor plus the current credentials. The descriptor itself is never
//! modified here.
//!
//! Rules:
//! - Bearer token: attached when a token is stored and the caller did not set
//!   `Authorization` explicitly.
//! - `userId`: merged into the JSON body (POST/PUT/PATCH) or the query
//!   (GET), never replacing a value the caller already set. Injection is
//!   best-effort; a missing profile or a non-object body just skips it.

use transport::header::{AUTHORIZATION, HeaderValue};
use transport::{Method, OutboundRequest, RequestBody};
use tracing::{debug, warn};

/// Field name used for the injected user id.
pub const USER_ID_FIELD: &str = "userId";

/// Credentials read from the store for one attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decoration<'a> {
    pub access_token: Option<&'a str>,
    pub user_id: Option<i64>,
}

/// Produce the outbound value for one attempt.
pub fn decorate(request: &OutboundRequest, decoration: Decoration<'_>) -> OutboundRequest {
    let mut outbound = request.clone();

    if let Some(token) = decoration.access_token
        && !outbound.headers.contains_key(AUTHORIZATION)
    {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                outbound.headers.insert(AUTHORIZATION, value);
            }
            Err(e) => warn!(error = %e, "stored access token is not a valid header value, sending without it"),
        }
    }

    if let Some(user_id) = decoration.user_id {
        inject_user_id(&mut outbound, user_id);
    }

    outbound
}

fn inject_user_id(outbound: &mut OutboundRequest, user_id: i64) {
    if outbound.is_mutating() {
        match &mut outbound.body {
            RequestBody::Empty => {
                outbound.body = RequestBody::Json(serde_json::json!({ USER_ID_FIELD: user_id }));
            }
            RequestBody::Json(serde_json::Value::Object(map)) => {
                map.entry(USER_ID_FIELD)
                    .or_insert_with(|| serde_json::Value::from(user_id));
            }
            RequestBody::Json(_) => {
                debug!(path = %outbound.path, "non-object JSON body, userId not injected");
            }
            RequestBody::Multipart(form) => {
                if !form.has_field(USER_ID_FIELD) {
                    form.fields
                        .push((USER_ID_FIELD.to_string(), user_id.to_string()));
                }
            }
        }
    } else if outbound.method == Method::GET && !outbound.has_query(USER_ID_FIELD) {
        outbound
            .query
            .push((USER_ID_FIELD.to_string(), user_id.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use transport::MultipartForm;

    fn with(token: Option<&str>, user_id: Option<i64>) -> Decoration<'_> {
        Decoration {
            access_token: token,
            user_id,
        }
    }

    fn json_body(req: &OutboundRequest) -> &serde_json::Value {
        match &req.body {
            RequestBody::Json(v) => v,
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[test]
    fn attaches_bearer_token() {
        let out = decorate(&OutboundRequest::get("/employees"), with(Some("at_1"), None));
        assert_eq!(out.headers.get(AUTHORIZATION).unwrap(), "Bearer at_1");
    }

    #[test]
    fn explicit_authorization_is_kept() {
        let req = OutboundRequest::get("/employees")
            .with_header(AUTHORIZATION, "Bearer caller")
            .unwrap();
        let out = decorate(&req, with(Some("at_1"), None));
        assert_eq!(out.headers.get(AUTHORIZATION).unwrap(), "Bearer caller");
    }

    #[test]
    fn no_token_no_header() {
        let out = decorate(&OutboundRequest::get("/employees"), with(None, Some(7)));
        assert!(out.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn descriptor_is_not_modified() {
        let req = OutboundRequest::post("/employees").with_json(json!({"name": "Ada"}));
        let _ = decorate(&req, with(Some("at_1"), Some(42)));
        assert!(req.headers.is_empty());
        assert_eq!(json_body(&req), &json!({"name": "Ada"}));
    }

    #[test]
    fn injects_user_id_into_mutating_body() {
        for req in [
            OutboundRequest::post("/employees"),
            OutboundRequest::put("/employees/1"),
            OutboundRequest::patch("/employees/1"),
        ] {
            let req = req.with_json(json!({"name": "Ada"}));
            let out = decorate(&req, with(None, Some(42)));
            assert_eq!(json_body(&out), &json!({"name": "Ada", "userId": 42}));
        }
    }

    #[test]
    fn existing_user_id_in_body_is_not_overwritten() {
        let req = OutboundRequest::post("/employees").with_json(json!({"userId": 5}));
        let out = decorate(&req, with(None, Some(42)));
        assert_eq!(json_body(&out), &json!({"userId": 5}));
    }

    #[test]
    fn empty_mutating_body_becomes_object() {
        let out = decorate(&OutboundRequest::post("/auth/logout"), with(None, Some(42)));
        assert_eq!(json_body(&out), &json!({"userId": 42}));
    }

    #[test]
    fn array_body_is_left_alone() {
        let req = OutboundRequest::post("/bulk").with_json(json!([1, 2]));
        let out = decorate(&req, with(None, Some(42)));
        assert_eq!(json_body(&out), &json!([1, 2]));
    }

    #[test]
    fn injects_user_id_into_multipart() {
        let req = OutboundRequest::post("/data-filling/upload")
            .with_multipart(MultipartForm::new().text("templateId", "t1"));
        let out = decorate(&req, with(None, Some(7)));
        match &out.body {
            RequestBody::Multipart(form) => assert_eq!(
                form.fields,
                vec![
                    ("templateId".to_string(), "t1".to_string()),
                    ("userId".to_string(), "7".to_string())
                ]
            ),
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn injects_user_id_into_get_query() {
        let out = decorate(&OutboundRequest::get("/employees"), with(None, Some(7)));
        assert_eq!(out.query, vec![("userId".to_string(), "7".to_string())]);
        assert!(matches!(out.body, RequestBody::Empty));
    }

    #[test]
    fn existing_user_id_in_query_is_not_overwritten() {
        let req = OutboundRequest::get("/employees").with_query("userId", "99");
        let out = decorate(&req, with(None, Some(7)));
        assert_eq!(out.query, vec![("userId".to_string(), "99".to_string())]);
    }

    #[test]
    fn delete_gets_no_user_id() {
        let out = decorate(&OutboundRequest::delete("/employees/3"), with(None, Some(7)));
        assert!(out.query.is_empty());
        assert!(matches!(out.body, RequestBody::Empty));
    }

    #[test]
    fn invalid_token_is_skipped() {
        let out = decorate(&OutboundRequest::get("/employees"), with(Some("bad\ntoken"), None));
        assert!(out.headers.get(AUTHORIZATION).is_none());
    }
}
