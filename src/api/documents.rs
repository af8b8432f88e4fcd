use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;

use crate::app::AppState;
use crate::config::DateFormat;
use crate::error::AppError;
use crate::models::codec::{id_prefix, parse_id, DocumentKey, DOCUMENTS_PREFIX};
use crate::models::document::{
    CreateDocumentRequest, CreateDocumentResponse, DeleteDocumentQuery, DeleteDocumentResponse,
    Document,
};
use crate::storage::client::StorageClient;

/// Content type every document is stored with.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// List every stored document.
///
/// Objects outside `documents/` are ignored, and keys that do not decode are
/// skipped with a warning. The store's order is kept.
pub async fn list_documents(
    storage: &dyn StorageClient,
    date_format: &DateFormat,
) -> Result<Vec<Document>, AppError> {
    let objects = storage.list_objects(DOCUMENTS_PREFIX).await?;

    let documents = objects
        .into_iter()
        .filter(|object| object.key.starts_with(DOCUMENTS_PREFIX))
        .filter_map(|object| match DocumentKey::decode(&object.key) {
            Ok(meta) => Some(Document {
                id: meta.id,
                title: meta.title,
                age_restriction: meta.age_restriction,
                upload_date: date_format.render(&object.uploaded_at),
                uploaded_at: object.uploaded_at,
                file_url: object.url,
            }),
            Err(e) => {
                tracing::warn!(key = %object.key, "Skipping undecodable document key: {e}");
                None
            }
        })
        .collect();

    Ok(documents)
}

/// Validate an upload and store it under a freshly generated id.
///
/// Nothing is written unless every field is present and the payload decodes.
pub async fn create_document(
    storage: &dyn StorageClient,
    request: CreateDocumentRequest,
) -> Result<CreateDocumentResponse, AppError> {
    let title = non_blank(request.title);
    let age_restriction = non_blank(request.age_restriction);
    let file_data = non_blank(request.file_data);

    let (title, age_restriction, file_data) = match (title, age_restriction, file_data) {
        (Some(title), Some(age), Some(data)) => (title, age, data),
        (title, age, data) => {
            let missing: Vec<&str> = [
                (title.is_none(), "title"),
                (age.is_none(), "ageRestriction"),
                (data.is_none(), "fileData"),
            ]
            .into_iter()
            .filter_map(|(is_missing, name)| is_missing.then_some(name))
            .collect();

            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
    };

    let content = decode_file_data(&file_data)?;

    let id = next_document_id();
    let key = DocumentKey::new(id, title, age_restriction).encode();
    let size = content.len();

    let url = storage.put_object(&key, content, PDF_CONTENT_TYPE).await?;

    tracing::info!(id, key = %key, size, "Document stored");

    Ok(CreateDocumentResponse { success: true, url })
}

/// Delete the first document whose key belongs to `id`.
///
/// An id that matches nothing still succeeds, with `deleted: false`, and no
/// deletion reaches the store.
pub async fn delete_document(
    storage: &dyn StorageClient,
    id: Option<&str>,
) -> Result<DeleteDocumentResponse, AppError> {
    let raw = id
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::Validation("id is required".into()))?;

    let id = parse_id(raw).ok_or_else(|| AppError::Validation(format!("Invalid id '{raw}'")))?;

    let prefix = id_prefix(id);
    let target = storage
        .list_objects(&prefix)
        .await?
        .into_iter()
        .find(|object| object.key.starts_with(&prefix));

    match target {
        Some(object) => {
            storage.delete_object(&object.key).await?;
            tracing::info!(id, key = %object.key, "Document deleted");
            Ok(DeleteDocumentResponse {
                success: true,
                deleted: true,
            })
        }
        None => {
            tracing::info!(id, "No document matched id, nothing deleted");
            Ok(DeleteDocumentResponse {
                success: true,
                deleted: false,
            })
        }
    }
}

/// Fetch the stored bytes of a document by object key.
pub async fn fetch_document(storage: &dyn StorageClient, key: &str) -> Result<Vec<u8>, AppError> {
    if !key.starts_with(DOCUMENTS_PREFIX) {
        return Err(AppError::NotFound("Document not found".into()));
    }

    storage
        .get_object(key)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}

/// Keeps the value as sent; whitespace only matters for the blank check.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn next_document_id() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

/// Decode a base64 data URL, or bare base64, into the PDF bytes.
fn decode_file_data(file_data: &str) -> Result<Vec<u8>, AppError> {
    let encoded = match file_data.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| AppError::Validation("fileData is not a valid data URL".into()))?;

            let mut params = header.split(';');
            let media_type = params.next().unwrap_or_default();
            if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
                return Err(AppError::Validation(
                    "fileData must be base64-encoded".into(),
                ));
            }
            if !media_type.is_empty() && !media_type.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
                return Err(AppError::Validation(format!(
                    "Only PDF files are accepted, got '{media_type}'"
                )));
            }
            data
        }
        None => file_data,
    };

    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let content = STANDARD
        .decode(compact)
        .map_err(|e| AppError::Validation(format!("fileData is not valid base64: {e}")))?;

    if content.is_empty() {
        return Err(AppError::Validation("fileData is empty".into()));
    }

    Ok(content)
}

/// Axum handler for `GET /api/documents`.
pub async fn list_documents_handler(
    State(state): State<AppState>,
) -> Result<axum::Json<Vec<Document>>, AppError> {
    let documents = list_documents(state.storage_client.as_ref(), &state.date_format).await?;
    Ok(axum::Json(documents))
}

/// Axum handler for `POST /api/documents`.
///
/// A body that is not JSON is a validation error, like a missing field. A
/// body over the upload limit is a 413.
pub async fn create_document_handler(
    State(state): State<AppState>,
    payload: Result<axum::Json<CreateDocumentRequest>, JsonRejection>,
) -> Result<axum::Json<CreateDocumentResponse>, AppError> {
    let axum::Json(request) = payload.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Validation(format!("Invalid JSON body: {}", e.body_text()))
        }
    })?;

    let response = create_document(state.storage_client.as_ref(), request).await?;
    Ok(axum::Json(response))
}

/// Axum handler for `DELETE /api/documents?id=<id>`.
pub async fn delete_document_handler(
    State(state): State<AppState>,
    query: Result<Query<DeleteDocumentQuery>, QueryRejection>,
) -> Result<axum::Json<DeleteDocumentResponse>, AppError> {
    let Query(query) =
        query.map_err(|e| AppError::Validation(format!("Invalid query: {}", e.body_text())))?;

    let response = delete_document(state.storage_client.as_ref(), query.id.as_deref()).await?;
    Ok(axum::Json(response))
}
