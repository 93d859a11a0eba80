//! Data-filling workflow: download a template, fill it, upload it back as a
//! batch, then inspect or export the calculated results.

use bytes::Bytes;
use gateway::{Gateway, Result};
use serde_json::Value;
use transport::{FilePart, MultipartForm, OutboundRequest};

use super::{payload, records, segment};

pub async fn templates(gateway: &Gateway) -> Result<Vec<Value>> {
    Ok(records(
        gateway
            .send_json(OutboundRequest::get("/data-filling/templates"))
            .await?,
    ))
}

/// Previously uploaded batches, newest first as the backend orders them.
pub async fn history(gateway: &Gateway) -> Result<Vec<Value>> {
    Ok(records(
        gateway
            .send_json(OutboundRequest::get("/data-filling/history"))
            .await?,
    ))
}

pub async fn preview(gateway: &Gateway, template_id: &str) -> Result<Value> {
    let request = OutboundRequest::get(format!(
        "/data-filling/template/{}/preview",
        segment(template_id)
    ));
    Ok(payload(gateway.send_json(request).await?))
}

/// Blank workbook for a template.
pub async fn download(gateway: &Gateway, template_id: &str) -> Result<Bytes> {
    let request =
        OutboundRequest::get(format!("/data-filling/download/{}", segment(template_id)));
    Ok(gateway.send(request).await?.body)
}

pub async fn upload(gateway: &Gateway, file: FilePart, template_id: &str) -> Result<Value> {
    let form = MultipartForm::new()
        .file(file)
        .text("templateId", template_id);
    let request = OutboundRequest::post("/data-filling/upload").with_multipart(form);
    Ok(payload(gateway.send_json(request).await?))
}

/// Calculated records of one batch: `{ records, template }`.
pub async fn calculated(gateway: &Gateway, batch_id: &str) -> Result<Value> {
    let request = OutboundRequest::get(format!(
        "/data-filling/batch/{}/calculated",
        segment(batch_id)
    ));
    Ok(payload(gateway.send_json(request).await?))
}

/// Filled workbook of one batch.
pub async fn export(gateway: &Gateway, batch_id: &str) -> Result<Bytes> {
    let request = OutboundRequest::get(format!(
        "/data-filling/batch/{}/export",
        segment(batch_id)
    ));
    Ok(gateway.send(request).await?.body)
}
