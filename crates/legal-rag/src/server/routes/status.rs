//! Liveness and index status endpoints

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::{HealthResponse, StatusResponse};

/// GET / - Service banner with the indexed chunk count
pub async fn root(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Legal RAG backend running".to_string(),
        indexed_chunks: state.pipeline().indexed_chunks().await,
    })
}

/// GET /health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
