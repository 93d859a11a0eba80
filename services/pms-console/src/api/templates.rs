//! Excel header templates

use bytes::Bytes;
use gateway::{Gateway, Result};
use serde_json::Value;
use transport::{FilePart, MultipartForm, OutboundRequest};

use super::{payload, records, segment};

/// Template fetched when no name is given.
pub const DEFAULT_TEMPLATE: &str = "PMS-APAC-Header";

pub async fn list(gateway: &Gateway) -> Result<Vec<Value>> {
    Ok(records(
        gateway.send_json(OutboundRequest::get("/excel/templates")).await?,
    ))
}

/// Fetch one template by name, falling back to [`DEFAULT_TEMPLATE`].
pub async fn get(gateway: &Gateway, name: Option<&str>) -> Result<Value> {
    let name = name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_TEMPLATE);
    let request = OutboundRequest::get(format!("/excel/template/{}", segment(name)));
    Ok(payload(gateway.send_json(request).await?))
}

/// Search by name through the query-string endpoint.
pub async fn find(gateway: &Gateway, name: &str) -> Result<Value> {
    let request = OutboundRequest::get("/excel/template").with_query("templateName", name);
    Ok(payload(gateway.send_json(request).await?))
}

/// Register a new header template from a spreadsheet.
///
/// Optional fields are only sent when non-empty.
pub async fn upload(
    gateway: &Gateway,
    file: FilePart,
    template_name: Option<&str>,
    description: Option<&str>,
) -> Result<Value> {
    let mut form = MultipartForm::new().file(file);
    if let Some(name) = template_name.filter(|n| !n.is_empty()) {
        form = form.text("templateName", name);
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        form = form.text("description", description);
    }
    let request = OutboundRequest::post("/excel/uploadHeaderExcel").with_multipart(form);
    Ok(payload(gateway.send_json(request).await?))
}

/// Raw workbook bytes of a stored template.
pub async fn download(gateway: &Gateway, id: &str) -> Result<Bytes> {
    let request = OutboundRequest::get(format!("/excel/download/{}", segment(id)));
    Ok(gateway.send(request).await?.body)
}

pub async fn delete(gateway: &Gateway, id: &str) -> Result<()> {
    gateway
        .send(OutboundRequest::delete(format!("/excel/template/{}", segment(id))))
        .await?;
    Ok(())
}
