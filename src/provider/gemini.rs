//! Gemini `generateContent` backend.
//!
//! Gemini's built-in `google_search` tool does not surface as a function call.
//! The search shows up as `groundingMetadata` on the candidate: the queries it
//! ran, the web pages it cited ("grounding chunks"), and the answer segments
//! each page supports. That metadata is folded into a single `google_search`
//! tool invocation so the orchestrator sees one uniform shape. Explicit
//! `functionResponse` parts are passed through as invocations too.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    CompletionRequest, CompletionResponse, CompletionService, ProviderError, ToolInvocation,
    WEB_SEARCH_TOOL,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GeminiClient {
    client: Client,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different endpoint (proxy, regional gateway, test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{base}/v1beta/models/{model}:generateContent",
            base = self.base_url.trim_end_matches('/'),
            model = self.model
        )
    }

    fn build_api_request(request: &CompletionRequest) -> GenerateRequest {
        let tools = request.tools.as_ref().map(|tool| {
            if tool.name == WEB_SEARCH_TOOL {
                vec![ApiTool {
                    google_search: Some(json!({})),
                }]
            } else {
                // Only the built-in search tool is declared by this service.
                tracing::warn!(tool = %tool.name, "Ignoring unsupported tool declaration");
                Vec::new()
            }
        });

        GenerateRequest {
            contents: vec![ReqContent {
                role: "user",
                parts: vec![ReqPart {
                    text: request.instruction.clone(),
                }],
            }],
            tools: tools.filter(|t| !t.is_empty()),
        }
    }

    fn parse_response(response: GenerateResponse) -> CompletionResponse {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return CompletionResponse::default();
        };

        let mut texts = Vec::new();
        let mut tool_invocations = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text {
                if !text.trim().is_empty() {
                    texts.push(text);
                }
            }
            if let Some(fr) = part.function_response {
                tool_invocations.push(ToolInvocation {
                    name: fr.name,
                    output: fr.response,
                });
            }
        }

        if let Some(grounding) = candidate.grounding_metadata {
            if grounding.was_searched() {
                tool_invocations.push(ToolInvocation {
                    name: WEB_SEARCH_TOOL.to_string(),
                    output: grounding.into_search_output(),
                });
            }
        }

        CompletionResponse {
            text: if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            },
            tool_invocations,
        }
    }

    fn parse_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
        let error_msg = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| body.to_string());

        match status.as_u16() {
            401 | 403 => ProviderError::Auth(error_msg),
            429 => ProviderError::RateLimited(error_msg),
            _ => ProviderError::Other(format!("HTTP {status}: {error_msg}")),
        }
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(
        &self,
        api_key: &str,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let api_request = Self::build_api_request(&request);

        let http_response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let body = http_response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".into());
            return Err(Self::parse_error(status, &body));
        }

        let api_response: GenerateResponse = http_response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Self::parse_response(api_response))
    }
}

// Request wire types

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<ReqContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiTool>>,
}

#[derive(Debug, Serialize)]
struct ReqContent {
    role: &'static str,
    parts: Vec<ReqPart>,
}

#[derive(Debug, Serialize)]
struct ReqPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(skip_serializing_if = "Option::is_none")]
    google_search: Option<Value>,
}

// Response wire types. Every field is optional: the shape varies by model
// version and by whether the search tool ran.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Candidate {
    content: Option<RespContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RespContent {
    parts: Vec<RespPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RespPart {
    text: Option<String>,
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GroundingMetadata {
    web_search_queries: Vec<String>,
    grounding_chunks: Vec<GroundingChunk>,
    grounding_supports: Vec<GroundingSupport>,
    search_entry_point: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GroundingSupport {
    segment: Option<Segment>,
    grounding_chunk_indices: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Segment {
    text: Option<String>,
}

impl GroundingMetadata {
    fn was_searched(&self) -> bool {
        !self.web_search_queries.is_empty()
            || !self.grounding_chunks.is_empty()
            || self.search_entry_point.is_some()
    }

    /// `{queries, results: [{title, snippet, url}]}` in chunk order.
    /// Fields the metadata does not carry are left out; the extractor fills placeholders.
    fn into_search_output(self) -> Value {
        let results: Vec<Value> = self
            .grounding_chunks
            .iter()
            .enumerate()
            .filter_map(|(idx, chunk)| {
                let web = chunk.web.as_ref()?;
                let snippet = self
                    .grounding_supports
                    .iter()
                    .find(|s| s.grounding_chunk_indices.contains(&idx))
                    .and_then(|s| s.segment.as_ref())
                    .and_then(|seg| seg.text.clone());

                let mut item = serde_json::Map::new();
                if let Some(title) = &web.title {
                    item.insert("title".into(), Value::String(title.clone()));
                }
                if let Some(snippet) = snippet {
                    item.insert("snippet".into(), Value::String(snippet));
                }
                if let Some(uri) = &web.uri {
                    item.insert("url".into(), Value::String(uri.clone()));
                }
                Some(Value::Object(item))
            })
            .collect();

        json!({
            "queries": self.web_search_queries,
            "results": results,
        })
    }
}
