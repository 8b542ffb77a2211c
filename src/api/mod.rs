//! HTTP transport: router, shared state, and error mapping.

pub mod cache;
pub mod llm;
pub mod rag;
pub mod status;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{QueryError, StoreError};
use crate::llm::Orchestrator;
use crate::store::{CacheStore, RetrieverStore};
use crate::telemetry::Metrics;

/// Handler result alias.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Shared state behind every handler.
///
/// The store handles here wrap the same collections the orchestrator
/// queries, so management writes are visible to in-flight queries.
#[derive(Clone)]
pub struct AppState {
    /// The query pipeline.
    pub orchestrator: Arc<Orchestrator>,
    /// Management handle over the cache collection.
    pub cache: Arc<CacheStore>,
    /// Management handle over the retriever collection.
    pub retriever: Arc<RetrieverStore>,
    /// Counter registry served by the metrics endpoint.
    pub metrics: Arc<Metrics>,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The query pipeline failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A store management operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body or query string was invalid.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Query(QueryError::Llm { .. } | QueryError::MalformedOutput(_)) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Query(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Builds the application router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(status::health))
        .route("/api/v1/llm", post(llm::query))
        .route(
            "/api/v1/cache",
            post(cache::add).get(cache::query).delete(cache::clear),
        )
        .route("/api/v1/cache/{id}", delete(cache::remove))
        .route(
            "/api/v1/rag",
            post(rag::add).get(rag::query).delete(rag::clear),
        )
        .route("/api/v1/rag/{id}", delete(rag::remove))
        .route("/api/v1/status", get(status::status))
        .route("/api/v1/metrics", get(status::metrics))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Query-string parameters shared by the store query endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct StoreQuery {
    /// Text to match against the collection.
    pub q: String,
    /// Include stored embeddings in the response.
    #[serde(default)]
    pub e: bool,
}

/// Drops embeddings from retrieved facts unless explicitly requested.
pub(crate) fn strip_embeddings(
    mut facts: Vec<crate::store::RetrievedFact>,
    keep: bool,
) -> Vec<crate::store::RetrievedFact> {
    if !keep {
        for fact in &mut facts {
            fact.embedding.clear();
        }
    }
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RetrievedFact;
    use std::collections::HashMap;

    fn fact_with_embedding() -> RetrievedFact {
        RetrievedFact {
            id: "x".to_string(),
            content: "c".to_string(),
            similarity: 0.5,
            metadata: HashMap::new(),
            embedding: vec![1.0, 2.0],
        }
    }

    #[test]
    fn test_strip_embeddings_by_default() {
        let facts = strip_embeddings(vec![fact_with_embedding()], false);
        assert!(facts[0].embedding.is_empty());
    }

    #[test]
    fn test_embeddings_kept_on_request() {
        let facts = strip_embeddings(vec![fact_with_embedding()], true);
        assert_eq!(facts[0].embedding, vec![1.0, 2.0]);
    }

    #[test]
    fn test_stripped_embedding_not_serialized() {
        let facts = strip_embeddings(vec![fact_with_embedding()], false);
        let json = serde_json::to_string(&facts[0]).unwrap_or_default();
        assert!(!json.contains("embedding"));
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let response = ApiError::BadRequest("no query".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_llm_failure_maps_to_502() {
        let response = ApiError::Query(QueryError::Llm {
            message: "timeout".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
