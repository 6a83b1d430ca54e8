//! API routes for the legal RAG server

pub mod ask;
pub mod status;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderMap},
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;
use crate::types::Reference;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(status::root))
        .route("/health", get(status::health))
        .route("/ask", post(ask::ask))
        // Uploads get a larger body limit than the default 2MB
        .route(
            "/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/ask-with-doc",
            post(upload::ask_with_doc).layer(DefaultBodyLimit::max(max_upload_size)),
        )
}

/// PDF reference for a rendered report, linked through the request's Host
pub(crate) fn report_reference(state: &AppState, headers: &HeaderMap, file: &str) -> Reference {
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    Reference::pdf(file, state.report_url(host, file))
}
