use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::errors::{method_not_allowed, preflight};
use crate::api::{documents, files};
use crate::auth::admin::{auth_handler, AdminSecret};
use crate::config::DateFormat;
use crate::storage::client::StorageClient;

/// Shared, read-only state handed to every handler.
///
/// The blob store is the only source of truth; nothing here changes after
/// startup.
#[derive(Clone)]
pub struct AppState {
    pub storage_client: Arc<dyn StorageClient>,
    pub admin_secret: AdminSecret,
    pub date_format: DateFormat,
}

/// Build the API router.
///
/// Every route answers `OPTIONS` and replies 405 `{message}` to other
/// unsupported methods. When `site_root` is given, unmatched paths are served
/// from that directory.
pub fn build_router(state: AppState, max_upload_bytes: usize, site_root: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route(
            "/api/auth",
            post(auth_handler)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/documents",
            get(documents::list_documents_handler)
                .post(documents::create_document_handler)
                .delete(documents::delete_document_handler)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/files/{*key}",
            get(files::serve_document_handler)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match site_root {
        Some(root) => router.fallback_service(ServeDir::new(root)),
        None => router,
    }
}
