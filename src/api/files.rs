use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::api::documents::{fetch_document, PDF_CONTENT_TYPE};
use crate::app::AppState;
use crate::error::AppError;

/// Axum handler for `GET /api/files/{*key}`.
///
/// Serves a stored PDF when the bucket is not publicly reachable. The path
/// segment is the object key (percent-decoded once by the router).
pub async fn serve_document_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let data = fetch_document(state.storage_client.as_ref(), &key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        data,
    )
        .into_response())
}
