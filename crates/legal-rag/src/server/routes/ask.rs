//! Question answering endpoint

use axum::{extract::State, http::HeaderMap, Json};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

use super::report_reference;

/// POST /ask - Answer a legal question
pub async fn ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(Error::bad_request("Missing query"));
    }

    tracing::info!("Query: \"{}\"", query);

    let outcome = state.pipeline().run(query, query).await?;
    let reference = report_reference(&state, &headers, &outcome.report.filename);

    Ok(Json(AskResponse {
        answer: outcome.answer,
        references: vec![reference],
    }))
}
