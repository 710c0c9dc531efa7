use std::env;
use std::time::Duration;

/// How the orchestrator turns a query into a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// One call with the search tool declared.
    /// The summary is whatever text the model produced alongside the tool call.
    Direct,
    /// Search call, then a second call without tools that digests the extracted items.
    SearchThenSummarize,
}

impl SearchStrategy {
    pub fn from_env() -> Self {
        Self::parse(&env::var("SEARCH_STRATEGY").unwrap_or_default())
    }

    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "direct" | "single" | "single-call" => Self::Direct,
            _ => Self::SearchThenSummarize,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::SearchThenSummarize => "search-then-summarize",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    /// Credential for the Gemini API. `None` is a configuration error reported per request.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub strategy: SearchStrategy,
    /// Upper bound on result items returned per request.
    pub max_results: usize,
    /// Timeout applied to each outbound completion call.
    pub upstream_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_secs: 5,
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            strategy: SearchStrategy::SearchThenSummarize,
            max_results: 10,
            upstream_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to [`Config::default`].
    ///
    /// A missing `GEMINI_API_KEY` is not an error here: the server still starts,
    /// reports not-ready, and answers search requests with a configuration error.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: match env::var("PORT") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.port,
            },
            shutdown_timeout_secs: match env::var("SHUTDOWN_TIMEOUT") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.shutdown_timeout_secs,
            },
            api_key: non_empty_var("GEMINI_API_KEY"),
            model: non_empty_var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: non_empty_var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            strategy: SearchStrategy::from_env(),
            max_results: match env::var("MAX_RESULTS") {
                Ok(v) => v.parse::<usize>()?.max(1),
                Err(_) => defaults.max_results,
            },
            upstream_timeout_secs: match env::var("UPSTREAM_TIMEOUT") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.upstream_timeout_secs,
            },
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
