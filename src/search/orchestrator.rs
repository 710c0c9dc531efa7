//! Search orchestration against the completion service.
//!
//! **Stage 1 (search)**: one call with the web search tool declared. The
//! response is classified into a [`ToolInvocationResult`].
//!
//! **Stage 2 (summarize)**: only for [`SearchStrategy::SearchThenSummarize`]
//! and only when stage 1 produced items. A second call without tools digests
//! the items. If it fails or comes back empty, the summary is the literal
//! item rendering; stage 2 never fails the request.
//!
//! Every outbound call is bounded by `call_timeout` and attempted once.

use crate::config::{Config, SearchStrategy};
use crate::provider::{
    CompletionRequest, CompletionResponse, CompletionService, ProviderError, ToolSpec,
    WEB_SEARCH_TOOL,
};
use crate::search::extract::classify_response;
use crate::search::prompt::{render_items, search_instruction, summary_instruction};
use crate::search::types::{
    HandlerOutcome, NormalizedSearchResult, SearchItem, SearchQuery, ToolInvocationResult,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

const DEFAULT_MAX_RESULTS: usize = 10;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
enum CallError {
    #[error("timeout")]
    Timeout,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

pub struct SearchOrchestrator {
    service: Arc<dyn CompletionService>,
    strategy: SearchStrategy,
    max_results: usize,
    call_timeout: Duration,
}

impl SearchOrchestrator {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            strategy: SearchStrategy::SearchThenSummarize,
            max_results: DEFAULT_MAX_RESULTS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config, service: Arc<dyn CompletionService>) -> Self {
        Self::new(service)
            .with_strategy(config.strategy)
            .with_max_results(config.max_results)
            .with_call_timeout(config.upstream_timeout())
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    /// Run one query to completion. Never panics or propagates an error:
    /// every failure becomes a [`HandlerOutcome`] variant.
    pub async fn run(&self, query: &SearchQuery, api_key: Option<&str>) -> HandlerOutcome {
        let Some(api_key) = api_key.filter(|k| !k.is_empty()) else {
            return HandlerOutcome::ConfigError("missing credential".to_string());
        };

        let start = Instant::now();

        let request =
            CompletionRequest::with_tool(search_instruction(query), ToolSpec::web_search());
        let first = match self.call(api_key, request).await {
            Ok(response) => response,
            Err(e) => return HandlerOutcome::UpstreamError(e.to_string()),
        };

        tracing::debug!(
            stage1_ms = start.elapsed().as_millis() as u64,
            invocations = first.tool_invocations.len(),
            has_text = first.text.is_some(),
            "Stage 1 (search) completed"
        );

        match classify_response(first, WEB_SEARCH_TOOL, self.max_results) {
            ToolInvocationResult::Executed { items, .. } if items.is_empty() => {
                HandlerOutcome::NoResults("no relevant results".to_string())
            }
            ToolInvocationResult::Executed {
                tool_name,
                items,
                text,
            } => {
                let summary = match self.strategy {
                    SearchStrategy::Direct => text,
                    SearchStrategy::SearchThenSummarize => {
                        Some(self.summarize(api_key, query, &items).await)
                    }
                };

                tracing::debug!(
                    tool = %tool_name,
                    items = items.len(),
                    total_ms = start.elapsed().as_millis() as u64,
                    "Search orchestration completed"
                );

                HandlerOutcome::Success(NormalizedSearchResult { summary, items })
            }
            ToolInvocationResult::UnexpectedTool { tool_name } => {
                HandlerOutcome::UpstreamError(format!("unexpected tool invoked: {}", tool_name))
            }
            ToolInvocationResult::DirectText(text) => {
                tracing::info!("Model answered without invoking the search tool");
                HandlerOutcome::Success(NormalizedSearchResult {
                    summary: Some(text),
                    items: Vec::new(),
                })
            }
            ToolInvocationResult::Unrecognized => {
                HandlerOutcome::UpstreamError("unrecognized response shape".to_string())
            }
        }
    }

    /// Second-stage digest of `items`, falling back to the raw rendering.
    async fn summarize(&self, api_key: &str, query: &SearchQuery, items: &[SearchItem]) -> String {
        let start = Instant::now();
        let request = CompletionRequest::text_only(summary_instruction(query, items));

        let text = match self.call(api_key, request).await {
            Ok(response) => response
                .text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Summarization call failed");
                None
            }
        };

        tracing::debug!(
            stage2_ms = start.elapsed().as_millis() as u64,
            summarized = text.is_some(),
            "Stage 2 (summarize) completed"
        );

        text.unwrap_or_else(|| {
            tracing::warn!("Falling back to unsummarized search results");
            render_items(items)
        })
    }

    async fn call(
        &self,
        api_key: &str,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CallError> {
        tokio::time::timeout(self.call_timeout, self.service.complete(api_key, request))
            .await
            .map_err(|_| CallError::Timeout)?
            .map_err(CallError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolInvocation;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replays scripted responses in order and records every request.
    struct ScriptedService {
        responses: Mutex<Vec<Result<CompletionResponse, ProviderError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedService {
        fn new(responses: Vec<Result<CompletionResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedService {
        async fn complete(
            &self,
            _api_key: &str,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())))
        }
    }

    struct SlowService;

    #[async_trait]
    impl CompletionService for SlowService {
        async fn complete(
            &self,
            _api_key: &str,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CompletionResponse::default())
        }
    }

    /// Answers the search call at once and stalls on the summary call.
    struct SlowSummaryService;

    #[async_trait]
    impl CompletionService for SlowSummaryService {
        async fn complete(
            &self,
            _api_key: &str,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            if request.tools.is_some() {
                return Ok(search_response(paris(), None));
            }
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(text_response("too late"))
        }
    }

    fn search_response(results: serde_json::Value, text: Option<&str>) -> CompletionResponse {
        CompletionResponse {
            text: text.map(str::to_string),
            tool_invocations: vec![ToolInvocation {
                name: WEB_SEARCH_TOOL.to_string(),
                output: json!({ "results": results }),
            }],
        }
    }

    fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            text: Some(text.to_string()),
            tool_invocations: vec![],
        }
    }

    fn paris() -> serde_json::Value {
        json!([{ "title": "Paris", "snippet": "Paris is the capital of France.", "url": "https://example.com/paris" }])
    }

    fn query() -> SearchQuery {
        SearchQuery::new("capital of France").unwrap()
    }

    #[tokio::test]
    async fn missing_credential_makes_no_call() {
        let service = ScriptedService::new(vec![]);
        let orchestrator = SearchOrchestrator::new(service.clone());

        assert_eq!(
            orchestrator.run(&query(), None).await,
            HandlerOutcome::ConfigError("missing credential".into())
        );
        assert_eq!(
            orchestrator.run(&query(), Some("")).await,
            HandlerOutcome::ConfigError("missing credential".into())
        );
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn two_stage_uses_summary_call() {
        let service = ScriptedService::new(vec![
            Ok(search_response(paris(), None)),
            Ok(text_response("Paris is the capital of France.")),
        ]);
        let orchestrator = SearchOrchestrator::new(service.clone());

        let HandlerOutcome::Success(result) = orchestrator.run(&query(), Some("key")).await else {
            panic!("expected success");
        };
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.summary.as_deref(), Some("Paris is the capital of France."));

        let requests = service.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools, Some(ToolSpec::web_search()));
        assert!(requests[1].tools.is_none());
        assert!(requests[1].instruction.contains("1. Paris"));
    }

    #[tokio::test]
    async fn summary_failure_falls_back_to_raw_items() {
        let service = ScriptedService::new(vec![
            Ok(search_response(paris(), None)),
            Err(ProviderError::Transport("connection reset".into())),
        ]);
        let orchestrator = SearchOrchestrator::new(service);

        let HandlerOutcome::Success(result) = orchestrator.run(&query(), Some("key")).await else {
            panic!("expected success");
        };
        let summary = result.summary.unwrap();
        assert!(summary.starts_with("1. Paris"));
        assert!(summary.contains("https://example.com/paris"));
    }

    #[tokio::test]
    async fn empty_summary_falls_back_to_raw_items() {
        let service = ScriptedService::new(vec![
            Ok(search_response(paris(), None)),
            Ok(text_response("   ")),
        ]);
        let orchestrator = SearchOrchestrator::new(service);

        let HandlerOutcome::Success(result) = orchestrator.run(&query(), Some("key")).await else {
            panic!("expected success");
        };
        assert!(result.summary.unwrap().starts_with("1. Paris"));
    }

    #[tokio::test]
    async fn direct_strategy_makes_single_call() {
        let service = ScriptedService::new(vec![Ok(search_response(paris(), Some("Paris.")))]);
        let orchestrator =
            SearchOrchestrator::new(service.clone()).with_strategy(SearchStrategy::Direct);

        let HandlerOutcome::Success(result) = orchestrator.run(&query(), Some("key")).await else {
            panic!("expected success");
        };
        assert_eq!(result.summary.as_deref(), Some("Paris."));
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_results_is_no_results_without_summary_call() {
        let service = ScriptedService::new(vec![Ok(search_response(json!([]), Some("hmm")))]);
        let orchestrator = SearchOrchestrator::new(service.clone());

        assert_eq!(
            orchestrator.run(&query(), Some("key")).await,
            HandlerOutcome::NoResults("no relevant results".into())
        );
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test]
    async fn direct_text_becomes_summary() {
        let service = ScriptedService::new(vec![Ok(text_response("Paris."))]);
        let orchestrator = SearchOrchestrator::new(service.clone());

        assert_eq!(
            orchestrator.run(&query(), Some("key")).await,
            HandlerOutcome::Success(NormalizedSearchResult {
                summary: Some("Paris.".into()),
                items: vec![],
            })
        );
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test]
    async fn unrecognized_and_unexpected_are_upstream_errors() {
        let service = ScriptedService::new(vec![
            Ok(CompletionResponse::default()),
            Ok(CompletionResponse {
                text: None,
                tool_invocations: vec![ToolInvocation {
                    name: "code_execution".into(),
                    output: json!({}),
                }],
            }),
        ]);
        let orchestrator = SearchOrchestrator::new(service);

        assert_eq!(
            orchestrator.run(&query(), Some("key")).await,
            HandlerOutcome::UpstreamError("unrecognized response shape".into())
        );
        assert_eq!(
            orchestrator.run(&query(), Some("key")).await,
            HandlerOutcome::UpstreamError("unexpected tool invoked: code_execution".into())
        );
    }

    #[tokio::test]
    async fn provider_error_is_upstream_error() {
        let service = ScriptedService::new(vec![Err(ProviderError::Auth("bad key".into()))]);
        let orchestrator = SearchOrchestrator::new(service);

        assert_eq!(
            orchestrator.run(&query(), Some("key")).await,
            HandlerOutcome::UpstreamError("authentication failed: bad key".into())
        );
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let orchestrator = SearchOrchestrator::new(Arc::new(SlowService))
            .with_call_timeout(Duration::from_millis(20));

        assert_eq!(
            orchestrator.run(&query(), Some("key")).await,
            HandlerOutcome::UpstreamError("timeout".into())
        );
    }

    #[tokio::test]
    async fn slow_summary_falls_back_to_raw_items() {
        let orchestrator = SearchOrchestrator::new(Arc::new(SlowSummaryService))
            .with_call_timeout(Duration::from_millis(20));

        let HandlerOutcome::Success(result) = orchestrator.run(&query(), Some("key")).await else {
            panic!("expected success");
        };
        assert_eq!(result.items.len(), 1);
        assert!(result.summary.unwrap().starts_with("1. Paris"));
    }

    #[tokio::test]
    async fn max_results_bounds_items() {
        let results: Vec<serde_json::Value> = (0..25)
            .map(|i| json!({ "title": format!("r{}", i), "snippet": "s", "url": "u" }))
            .collect();
        let service = ScriptedService::new(vec![Ok(search_response(json!(results), Some("t")))]);
        let orchestrator = SearchOrchestrator::new(service)
            .with_strategy(SearchStrategy::Direct)
            .with_max_results(10);

        let HandlerOutcome::Success(result) = orchestrator.run(&query(), Some("key")).await else {
            panic!("expected success");
        };
        assert_eq!(result.items.len(), 10);
        assert_eq!(result.items[0].title, "r0");
        assert_eq!(result.items[9].title, "r9");
    }
}
