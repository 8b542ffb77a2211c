//! Knowledge-base management endpoints.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::store::RetrievedFact;

use super::cache::AddResponse;
use super::{AppState, Result, StoreQuery, strip_embeddings};

/// Body of `POST /api/v1/rag`.
///
/// A tool descriptor is stored by setting `metadata` to
/// `{"type": "TOOL", "name": "<tool>"}`.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    /// The fact text.
    pub fact: String,
    /// Free-form string metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// POST /api/v1/rag
pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddRequest>,
) -> Result<Json<AddResponse>> {
    let id = state.retriever.add(&body.fact, body.metadata).await?;
    Ok(Json(AddResponse { id }))
}

/// GET /api/v1/rag?q=...&e=...
pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<StoreQuery>,
) -> Result<Json<Vec<RetrievedFact>>> {
    let facts = state.retriever.query(&params.q).await?;
    Ok(Json(strip_embeddings(facts, params.e)))
}

/// DELETE /api/v1/rag/{id}
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<()> {
    state.retriever.delete(&id).await?;
    Ok(())
}

/// DELETE /api/v1/rag
pub async fn clear(State(state): State<AppState>) -> Result<()> {
    state.retriever.clear().await?;
    Ok(())
}
