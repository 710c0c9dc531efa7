use crate::config::Config;
use crate::provider::{CompletionService, GeminiClient};
use crate::search::SearchOrchestrator;
use std::sync::Arc;

/// Application state shared across all request handlers.
/// Read-only after startup; requests share nothing mutable.
pub struct AppState {
    pub orchestrator: SearchOrchestrator,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state around the Gemini backend described by `config`.
    pub fn new(config: Config) -> Self {
        let client = GeminiClient::new(config.model.clone()).with_base_url(config.base_url.clone());
        Self::with_service(config, Arc::new(client))
    }

    /// Build state around any completion backend (stubs in tests).
    pub fn with_service(config: Config, service: Arc<dyn CompletionService>) -> Self {
        if !config.has_credential() {
            tracing::warn!(
                kind = "configuration",
                "GEMINI_API_KEY is not set; search requests will fail until it is configured"
            );
        }

        let orchestrator = SearchOrchestrator::from_config(&config, service);

        tracing::info!(
            model = %config.model,
            strategy = config.strategy.as_str(),
            max_results = config.max_results,
            upstream_timeout_secs = config.upstream_timeout_secs,
            "Search orchestrator configured"
        );

        Self {
            orchestrator,
            config: Arc::new(config),
        }
    }

    /// Ready once a credential is available for the upstream service.
    pub fn is_ready(&self) -> bool {
        self.config.has_credential()
    }
}
