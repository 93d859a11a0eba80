//! Employee directory

use gateway::{Error, Gateway, Result};
use serde::Serialize;
use serde_json::Value;
use transport::OutboundRequest;

use super::{payload, records, segment};

const EMPLOYEES_PATH: &str = "/employees";
const DROPDOWN_PATH: &str = "/employees/dropdown";

/// Create/update payload.
///
/// An empty `reportsTo` is left out of the body entirely; the backend treats
/// a missing manager and an empty one differently.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub employee_id: String,
    pub name: String,
    pub email: String,
    pub designation: String,
    pub division: String,
    pub geography: String,
    pub department: String,
    #[serde(skip_serializing_if = "no_manager")]
    pub reports_to: Option<String>,
}

fn no_manager(reports_to: &Option<String>) -> bool {
    reports_to.as_deref().is_none_or(str::is_empty)
}

pub async fn list(gateway: &Gateway) -> Result<Vec<Value>> {
    Ok(records(gateway.send_json(OutboundRequest::get(EMPLOYEES_PATH)).await?))
}

/// Candidate managers for `reportsTo`.
pub async fn dropdown(gateway: &Gateway) -> Result<Vec<Value>> {
    Ok(records(gateway.send_json(OutboundRequest::get(DROPDOWN_PATH)).await?))
}

pub async fn create(gateway: &Gateway, input: &EmployeeInput) -> Result<Value> {
    let request = OutboundRequest::post(EMPLOYEES_PATH).with_json(to_body(input)?);
    Ok(payload(gateway.send_json(request).await?))
}

pub async fn update(gateway: &Gateway, id: &str, input: &EmployeeInput) -> Result<Value> {
    let request = OutboundRequest::put(format!("{EMPLOYEES_PATH}/{}", segment(id)))
        .with_json(to_body(input)?);
    Ok(payload(gateway.send_json(request).await?))
}

pub async fn delete(gateway: &Gateway, id: &str) -> Result<()> {
    gateway
        .send(OutboundRequest::delete(format!("{EMPLOYEES_PATH}/{}", segment(id))))
        .await?;
    Ok(())
}

fn to_body(input: &EmployeeInput) -> Result<Value> {
    serde_json::to_value(input).map_err(|e| Error::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::gateway_for;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ada() -> EmployeeInput {
        EmployeeInput {
            employee_id: "EMP001".into(),
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            designation: "Engineer".into(),
            division: "R&D".into(),
            geography: "APAC".into(),
            department: "Analytics".into(),
            reports_to: Some(String::new()),
        }
    }

    #[test]
    fn empty_reports_to_is_dropped() {
        let body = serde_json::to_value(ada()).unwrap();
        assert!(body.get("reportsTo").is_none());
        assert_eq!(body["employeeId"], "EMP001");

        let mut managed = ada();
        managed.reports_to = Some("64f0c2".into());
        let body = serde_json::to_value(managed).unwrap();
        assert_eq!(body["reportsTo"], "64f0c2");
    }

    #[tokio::test]
    async fn list_sends_bearer_and_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/employees"))
            .and(header("authorization", "Bearer at_1"))
            .and(query_param("userId", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"_id": "a1", "name": "Ada"}, {"_id": "b2", "name": "Grace"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let employees = list(&gateway).await.unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[1]["name"], "Grace");
    }

    #[tokio::test]
    async fn dropdown_lists_managers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/employees/dropdown"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"_id": "m1"}]})),
            )
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        assert_eq!(dropdown(&gateway).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_posts_body_with_user_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/employees"))
            .and(body_json(json!({
                "employeeId": "EMP001",
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "designation": "Engineer",
                "division": "R&D",
                "geography": "APAC",
                "department": "Analytics",
                "userId": 7
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"data": {"_id": "new1"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let created = create(&gateway, &ada()).await.unwrap();
        assert_eq!(created["_id"], "new1");
    }

    #[tokio::test]
    async fn update_puts_to_employee_path() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/employees/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"_id": "a1"}})))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        update(&gateway, "a1", &ada()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/employees/a1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        delete(&gateway, "a1").await.unwrap();
    }

    #[tokio::test]
    async fn server_rejection_is_an_api_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/employees"))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"message": "Employee ID already exists"})),
            )
            .mount(&server)
            .await;

        let gateway = gateway_for(&server).await;
        let err = create(&gateway, &ada()).await.unwrap_err();
        let failure = err.failure().unwrap();
        assert_eq!(failure.status, Some(409));
        assert_eq!(failure.message.as_deref(), Some("Employee ID already exists"));
    }
}
