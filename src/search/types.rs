//! Type definitions for the search pipeline.

use serde::Serialize;

/// A caller-supplied query. Always non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Returns `None` when the text is empty or whitespace-only.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One web result, in the order the search tool ranked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchItem {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// What the first completion call amounted to.
///
/// The upstream response can carry tool output, plain text, both, or neither.
/// This is the single place that ambiguity is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocationResult {
    /// The expected search tool ran. `items` is already truncated and may be empty.
    Executed {
        tool_name: String,
        items: Vec<SearchItem>,
        /// Text the model produced alongside the tool call, if any.
        text: Option<String>,
    },
    /// A tool ran, but not the one that was declared.
    UnexpectedTool { tool_name: String },
    /// The model answered without searching.
    DirectText(String),
    /// Neither tool output nor text.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedSearchResult {
    pub summary: Option<String>,
    pub items: Vec<SearchItem>,
}

/// Everything the orchestrator can conclude about one request.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    Success(NormalizedSearchResult),
    NoResults(String),
    ConfigError(String),
    UpstreamError(String),
}

impl HandlerOutcome {
    /// Label used for logs and the `outcome` metric dimension.
    pub fn label(&self) -> &'static str {
        match self {
            HandlerOutcome::Success(_) => "success",
            HandlerOutcome::NoResults(_) => "no_results",
            HandlerOutcome::ConfigError(_) => "config_error",
            HandlerOutcome::UpstreamError(_) => "upstream_error",
        }
    }
}
