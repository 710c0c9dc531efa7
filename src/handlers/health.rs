use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness body: what this instance would search with.
#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub model: String,
    pub strategy: &'static str,
}

/// GET /health - Liveness probe
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready - Readiness probe (503 until a Gemini credential is configured)
pub async fn ready_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadyResponse>) {
    let (status, label) = if state.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_configured")
    };

    (
        status,
        Json(ReadyResponse {
            status: label,
            model: state.config.model.clone(),
            strategy: state.orchestrator.strategy().as_str(),
        }),
    )
}
