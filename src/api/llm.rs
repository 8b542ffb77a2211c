//! The query endpoint.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm::Answer;

use super::{AppState, Result};

fn default_use_cache() -> bool {
    true
}

/// Body of `POST /api/v1/llm`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The question to answer.
    pub query: String,
    /// Return the full structured answer instead of just the text.
    #[serde(default)]
    pub details: bool,
    /// Consult and update the semantic cache for this query.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

/// Trimmed response returned when `details` is unset.
#[derive(Debug, Serialize)]
pub struct PlainAnswer {
    /// The answer text.
    pub response: String,
}

/// Either the full [`Answer`] or just its text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    /// Full structured answer.
    Full(Answer),
    /// Text-only answer.
    Plain(PlainAnswer),
}

/// POST /api/v1/llm
pub async fn query(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    if body.query.trim().is_empty() {
        return Err(super::ApiError::BadRequest("query must not be empty".to_string()));
    }

    info!(use_cache = body.use_cache, "query received");
    let answer = state.orchestrator.query(&body.query, body.use_cache).await?;

    if body.details {
        Ok(Json(QueryResponse::Full(answer)))
    } else {
        Ok(Json(QueryResponse::Plain(PlainAnswer {
            response: answer.response,
        })))
    }
}
