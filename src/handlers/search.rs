//! Web search endpoint.
//!
//! # Flow
//! 1. **Validation**: POST only, JSON body with a non-blank `query`
//! 2. **Orchestration**: search call, then optional summarization call
//! 3. **Composition**: outcome to status + JSON body
//!
//! The route is registered for every method so that non-POST requests get the
//! same JSON error shape as everything else instead of axum's empty 405.

use crate::error::{AppError, Result};
use crate::search::SearchQuery;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::Method,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Upper bound on the `/search` request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Accept only `POST` with a JSON body carrying a non-blank string `query`.
pub fn validate_request(method: &Method, body: &[u8]) -> Result<SearchQuery> {
    if *method != Method::POST {
        return Err(AppError::MethodNotAllowed);
    }

    let request: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedBody(format!("invalid JSON body: {}", e)))?;

    match request.get("query") {
        Some(Value::String(text)) => SearchQuery::new(text)
            .ok_or_else(|| AppError::MalformedBody("query cannot be empty".to_string())),
        Some(Value::Null) | None => Err(AppError::MalformedBody("query is required".to_string())),
        Some(_) => Err(AppError::MalformedBody(
            "query must be a string".to_string(),
        )),
    }
}

/// POST /search - search the web and summarize the results.
///
/// The body is taken as a `Result` so that a body rejection (over the size
/// limit, interrupted stream) still goes through the method check first and
/// renders as JSON.
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let validated = match body {
        Ok(body) => validate_request(&method, &body),
        Err(_) if method != Method::POST => Err(AppError::MethodNotAllowed),
        Err(rejection) => Err(AppError::from(rejection)),
    };

    let query = match validated {
        Ok(query) => query,
        Err(e) => {
            metrics::counter!("search_requests_total", "outcome" => "rejected").increment(1);
            return e.into_response();
        }
    };

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("search", %request_id, query = %query);

    async move {
        let start = std::time::Instant::now();

        let outcome = state
            .orchestrator
            .run(&query, state.config.api_key.as_deref())
            .await;

        let elapsed = start.elapsed();
        tracing::info!(
            outcome = outcome.label(),
            strategy = state.orchestrator.strategy().as_str(),
            total_ms = elapsed.as_millis() as u64,
            "Search request finished"
        );
        metrics::histogram!("search_latency_ms").record(elapsed.as_millis() as f64);

        outcome.into_response()
    }
    .instrument(span)
    .await
}
