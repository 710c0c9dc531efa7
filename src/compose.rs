//! Maps a [`HandlerOutcome`] to the HTTP status and JSON body the caller sees.

use crate::error::AppError;
use crate::search::{HandlerOutcome, NormalizedSearchResult, SearchItem};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub ai_summary: Option<String>,
    pub search_results: Option<SearchResults>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub items: Vec<SearchItem>,
}

impl From<NormalizedSearchResult> for SearchResponse {
    fn from(result: NormalizedSearchResult) -> Self {
        // Only the direct-text fallback produces no items.
        let search_results = if result.items.is_empty() {
            None
        } else {
            Some(SearchResults {
                items: result.items,
            })
        };

        Self {
            message: None,
            ai_summary: result.summary,
            search_results,
        }
    }
}

impl IntoResponse for HandlerOutcome {
    fn into_response(self) -> Response {
        metrics::counter!("search_requests_total", "outcome" => self.label()).increment(1);

        match self {
            HandlerOutcome::Success(result) => {
                tracing::info!(
                    items = result.items.len(),
                    summarized = result.summary.is_some(),
                    "Search succeeded"
                );
                (StatusCode::OK, Json(SearchResponse::from(result))).into_response()
            }
            HandlerOutcome::NoResults(reason) => {
                tracing::warn!(reason = %reason, "Search returned no results");
                let body = SearchResponse {
                    message: Some(reason),
                    ai_summary: None,
                    search_results: None,
                };
                (StatusCode::OK, Json(body)).into_response()
            }
            HandlerOutcome::ConfigError(reason) => AppError::Config(reason).into_response(),
            HandlerOutcome::UpstreamError(reason) => AppError::Upstream(reason).into_response(),
        }
    }
}
