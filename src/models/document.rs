use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A document as returned by the listing endpoint.
///
/// Everything except `file_url` and the upload timestamps is decoded from the
/// object key; see [`crate::models::codec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Creation timestamp in milliseconds, unique within a listing.
    pub id: u64,
    /// Human-readable title.
    pub title: String,
    /// Free-text age label (e.g. `18+`).
    pub age_restriction: String,
    /// Address the PDF can be downloaded from.
    pub file_url: String,
    /// Upload date rendered with the configured display format.
    pub upload_date: String,
    /// Upload instant as reported by the blob store.
    pub uploaded_at: DateTime<Utc>,
}

/// Request payload for `POST /api/documents`.
///
/// Fields are optional so that a missing field surfaces as a validation error
/// rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub age_restriction: Option<String>,
    /// Base64 data URL (`data:application/pdf;base64,...`) or bare base64.
    #[serde(default)]
    pub file_data: Option<String>,
}

/// Response for a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentResponse {
    pub success: bool,
    pub url: String,
}

/// Query string for `DELETE /api/documents`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteDocumentQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// Response for a delete request.
///
/// `success` is true whenever the request was valid; `deleted` tells whether an
/// object actually matched the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDocumentResponse {
    pub success: bool,
    pub deleted: bool,
}
