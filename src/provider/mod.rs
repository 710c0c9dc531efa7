//! The external AI completion service, as seen by the orchestrator.

pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use serde_json::Value;

/// Identifier of Gemini's built-in web search tool.
pub const WEB_SEARCH_TOOL: &str = "google_search";

/// A tool the model may invoke during a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
}

impl ToolSpec {
    /// Web search: accepts a list of query strings, returns an ordered list of
    /// `{title, snippet, url}` items.
    pub fn web_search() -> Self {
        Self {
            name: WEB_SEARCH_TOOL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub instruction: String,
    pub tools: Option<ToolSpec>,
}

impl CompletionRequest {
    pub fn with_tool(instruction: impl Into<String>, tool: ToolSpec) -> Self {
        Self {
            instruction: instruction.into(),
            tools: Some(tool),
        }
    }

    pub fn text_only(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            tools: None,
        }
    }
}

/// A tool the model executed, with its raw structured output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub output: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub tool_invocations: Vec<ToolInvocation>,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to parse response: {0}")]
    Decode(String),

    #[error("provider error: {0}")]
    Other(String),
}
