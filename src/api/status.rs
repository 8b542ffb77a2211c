//! Health, status, and metrics endpoints.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::json;

use crate::telemetry::MetricsSnapshot;

use super::AppState;

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Process facts reported by the status endpoint.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// User the process runs as.
    pub user: String,
    /// Current working directory.
    pub working_dir: String,
    /// Environment variables, sorted by name.
    pub env: Vec<String>,
}

/// GET /api/v1/status
pub async fn status() -> Json<StatusResponse> {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let working_dir = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let mut env: Vec<String> = std::env::vars().map(|(k, v)| format!("{k}={v}")).collect();
    env.sort();

    Json(StatusResponse {
        user,
        working_dir,
        env,
    })
}

/// GET /api/v1/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_ok() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_env_is_sorted() {
        let Json(body) = status().await;
        let mut sorted = body.env.clone();
        sorted.sort();
        assert_eq!(body.env, sorted);
        assert!(!body.working_dir.is_empty());
    }
}
