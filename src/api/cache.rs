//! Cache management endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use crate::store::RetrievedFact;

use super::{AppState, Result, StoreQuery, strip_embeddings};

/// Body of `POST /api/v1/cache`.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    /// The query text the cache entry should match against.
    pub fact: String,
    /// The canonical answer to serve on a hit.
    pub response: String,
    /// Comma-separated `KEY:VALUE` metadata tags.
    #[serde(default)]
    pub meta: String,
}

/// Id of a newly stored entry.
#[derive(Debug, Serialize)]
pub struct AddResponse {
    /// Assigned document id.
    pub id: String,
}

/// POST /api/v1/cache
pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddRequest>,
) -> Result<Json<AddResponse>> {
    let id = state.cache.add(&body.fact, &body.response, &body.meta).await?;
    Ok(Json(AddResponse { id }))
}

/// GET /api/v1/cache?q=...&e=...
pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<StoreQuery>,
) -> Result<Json<Vec<RetrievedFact>>> {
    let facts = state.cache.query(&params.q).await?;
    Ok(Json(strip_embeddings(facts, params.e)))
}

/// DELETE /api/v1/cache/{id}
pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> Result<()> {
    state.cache.delete(&id).await?;
    Ok(())
}

/// DELETE /api/v1/cache
pub async fn clear(State(state): State<AppState>) -> Result<()> {
    state.cache.clear().await?;
    Ok(())
}
