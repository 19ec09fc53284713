//! Three-phase staged upload protocol.
//!
//! Per file: **negotiate** a write-once staged target, **transfer** the raw
//! bytes to it, then **finalize** a file record referencing the transferred
//! object. Each phase can fail terminally for its file without advancing;
//! only a successful finalize makes the file visible to the Files library
//! (and therefore to [`super::FileIndex`] builds).

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::error::{FieldError, UploadError};
use super::local::LocalFile;
use crate::transport::{ApiClient, TransportError};

/// Negotiation mutation: asks for a staged target sized to the file.
const STAGED_UPLOADS_CREATE: &str = r#"
  mutation stagedUploadsCreate($input: [StagedUploadInput!]!) {
    stagedUploadsCreate(input: $input) {
      stagedTargets { url resourceUrl parameters { name value } }
      userErrors     { field message }
    }
  }
"#;

/// Finalize mutation: registers the transferred object as a file record.
const FILE_CREATE: &str = r#"
  mutation fileCreate($files: [FileCreateInput!]!) {
    fileCreate(files: $files) {
      files      { id }
      userErrors { field message }
    }
  }
"#;

/// A write-once upload target returned by the negotiation phase.
///
/// Valid for a single transfer attempt; never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct StagedTarget {
    /// URL the bytes are POSTed to.
    pub url: String,
    /// URL of the resulting object, referenced by finalize.
    #[serde(rename = "resourceUrl")]
    pub resource_url: String,
    /// Form fields the transfer must carry verbatim.
    pub parameters: Vec<StagedParameter>,
}

/// One required form field of a staged target.
#[derive(Debug, Clone, Deserialize)]
pub struct StagedParameter {
    /// Form field name.
    pub name: String,
    /// Form field value, passed through unmodified.
    pub value: String,
}

/// Runs all three phases for one local file.
///
/// Returns the created file record's id.
#[instrument(level = "debug", skip(client, file), fields(filename = %file.name))]
pub async fn upload(client: &ApiClient, file: &LocalFile) -> Result<String, UploadError> {
    let target = stage(client, file).await?;
    transfer(client, &target, file).await?;
    finalize(client, &target, file).await
}

/// Phase 1: negotiates a staged target for the file.
///
/// # Errors
///
/// `userErrors` from the mutation surface as [`UploadError::Staging`] and
/// are terminal for this file; the pipeline does not advance.
pub async fn stage(client: &ApiClient, file: &LocalFile) -> Result<StagedTarget, UploadError> {
    let variables = json!({
        "input": [{
            "filename":   file.name,
            "mimeType":   file.mime,
            "httpMethod": "POST",
            "resource":   "FILE",
            "fileSize":   file.size.to_string(),
        }]
    });
    let data = client.graphql(STAGED_UPLOADS_CREATE, variables).await?;
    let payload = data
        .get("stagedUploadsCreate")
        .ok_or_else(|| TransportError::protocol("missing `stagedUploadsCreate` in response"))?;

    let errors = user_errors(payload)?;
    if !errors.is_empty() {
        return Err(UploadError::Staging {
            filename: file.name.clone(),
            errors,
        });
    }

    let target = payload
        .get("stagedTargets")
        .and_then(Value::as_array)
        .and_then(|targets| targets.first())
        .cloned()
        .ok_or_else(|| TransportError::protocol("no staged target returned"))?;
    let target: StagedTarget = serde_json::from_value(target)
        .map_err(|e| TransportError::protocol(format!("unexpected staged target shape: {e}")))?;

    debug!(filename = %file.name, target_url = %target.url, "staged upload negotiated");
    Ok(target)
}

/// Phase 2: POSTs the file bytes to the staged target.
///
/// The target's form parameters are attached verbatim and unmodified,
/// followed by the raw bytes as the `file` part. A non-success status leaves
/// the file negotiated-but-untransferred and is not retried: the target is
/// not reusable after expiry.
pub async fn transfer(
    client: &ApiClient,
    target: &StagedTarget,
    file: &LocalFile,
) -> Result<(), UploadError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| UploadError::io(&file.path, e))?;

    let parameters = target.parameters.clone();
    let filename = file.name.clone();
    let make_form = move || {
        let mut form = Form::new();
        for parameter in &parameters {
            form = form.text(parameter.name.clone(), parameter.value.clone());
        }
        form.part(
            "file",
            Part::bytes(bytes.clone()).file_name(filename.clone()),
        )
    };

    match client.execute_form(&target.url, make_form).await {
        Ok(_) => {
            debug!(filename = %file.name, "bytes transferred to staged target");
            Ok(())
        }
        Err(TransportError::HttpStatus { status, .. }) => Err(UploadError::Transfer {
            filename: file.name.clone(),
            status,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Phase 3: creates the file record pointing at the transferred object.
///
/// The record's `alt` text is set to the original local filename so future
/// dedup index builds recognize the file even if the stored name changes.
/// Returns the created record's id.
pub async fn finalize(
    client: &ApiClient,
    target: &StagedTarget,
    file: &LocalFile,
) -> Result<String, UploadError> {
    let content_type = if file.mime.starts_with("image/") {
        "IMAGE"
    } else {
        "FILE"
    };
    let variables = json!({
        "files": [{
            "alt":            file.name,
            "contentType":    content_type,
            "originalSource": target.resource_url,
        }]
    });
    let data = client.graphql(FILE_CREATE, variables).await?;
    let payload = data
        .get("fileCreate")
        .ok_or_else(|| TransportError::protocol("missing `fileCreate` in response"))?;

    let errors = user_errors(payload)?;
    if !errors.is_empty() {
        return Err(UploadError::Finalize {
            filename: file.name.clone(),
            errors,
        });
    }

    let id = payload
        .get("files")
        .and_then(Value::as_array)
        .and_then(|records| records.first())
        .and_then(|record| record.get("id"))
        .and_then(Value::as_str)
        .ok_or_else(|| TransportError::protocol("no file record id returned"))?;

    debug!(filename = %file.name, id, "file record created");
    Ok(id.to_string())
}

/// Parses a mutation payload's `userErrors` list (missing means none).
fn user_errors(payload: &Value) -> Result<Vec<FieldError>, TransportError> {
    match payload.get("userErrors") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(errors) => serde_json::from_value(errors.clone())
            .map_err(|e| TransportError::protocol(format!("unexpected `userErrors` shape: {e}"))),
    }
}
