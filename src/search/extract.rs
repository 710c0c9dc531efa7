//! Classification and extraction of the first completion response.
//!
//! The search tool's output has changed shape across model versions: results
//! may be the output itself, or live under `results`, `items`, or a
//! `perQueryResult` list of per-query groups. Individual entries may use
//! `link`/`uri` for the URL and `description`/`content`/`text` for the
//! snippet. Missing fields get placeholders instead of failing the request.

use crate::provider::{CompletionResponse, ToolInvocation};
use crate::search::types::{SearchItem, ToolInvocationResult};
use serde_json::Value;

pub const PLACEHOLDER_TITLE: &str = "Untitled result";
pub const PLACEHOLDER_SNIPPET: &str = "No snippet available.";
pub const PLACEHOLDER_URL: &str = "#";

const TITLE_KEYS: &[&str] = &["title", "name"];
const SNIPPET_KEYS: &[&str] = &["snippet", "description", "content", "text"];
const URL_KEYS: &[&str] = &["url", "link", "uri"];

/// Reduce a completion response to one of the [`ToolInvocationResult`] cases.
///
/// An invocation of `expected_tool` wins over everything else. Any other tool
/// invocation is reported as unexpected. Text only counts when no tool ran.
pub fn classify_response(
    response: CompletionResponse,
    expected_tool: &str,
    max_items: usize,
) -> ToolInvocationResult {
    let text = response
        .text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    if let Some(invocation) = response
        .tool_invocations
        .iter()
        .find(|inv| is_search_tool(&inv.name, expected_tool))
    {
        return ToolInvocationResult::Executed {
            tool_name: invocation.name.clone(),
            items: extract_items(invocation, max_items),
            text,
        };
    }

    if let Some(other) = response.tool_invocations.first() {
        return ToolInvocationResult::UnexpectedTool {
            tool_name: other.name.clone(),
        };
    }

    match text {
        Some(text) => ToolInvocationResult::DirectText(text),
        None => ToolInvocationResult::Unrecognized,
    }
}

/// Older SDKs report the search tool as `<tool>_<method>` (e.g. `google_search_search`).
fn is_search_tool(name: &str, expected: &str) -> bool {
    name == expected
        || name
            .strip_prefix(expected)
            .is_some_and(|rest| rest.starts_with('_'))
}

/// Take the top `max_items` entries of a tool's output, in the order given.
pub fn extract_items(invocation: &ToolInvocation, max_items: usize) -> Vec<SearchItem> {
    let entries = result_entries(&invocation.output);

    let items: Vec<SearchItem> = entries
        .into_iter()
        .filter_map(normalize_item)
        .take(max_items)
        .collect();

    tracing::debug!(
        tool = %invocation.name,
        extracted = items.len(),
        "Search items extracted"
    );

    items
}

/// Locate the list of result entries inside a tool output.
fn result_entries(output: &Value) -> Vec<&Value> {
    if let Some(arr) = output.as_array() {
        return arr.iter().collect();
    }

    for key in ["results", "items"] {
        if let Some(arr) = output.get(key).and_then(|v| v.as_array()) {
            return arr.iter().collect();
        }
    }

    // perQueryResult: [{ query, results: [...] }, ...], flattened in order
    if let Some(groups) = output.get("perQueryResult").and_then(|v| v.as_array()) {
        return groups
            .iter()
            .filter_map(|g| g.get("results").and_then(|r| r.as_array()))
            .flatten()
            .collect();
    }

    Vec::new()
}

/// Build a [`SearchItem`] from one entry. Bare strings become the snippet.
/// Entries that are neither objects nor strings carry nothing usable.
fn normalize_item(entry: &Value) -> Option<SearchItem> {
    match entry {
        Value::Object(_) => Some(SearchItem {
            title: first_string(entry, TITLE_KEYS).unwrap_or_else(|| PLACEHOLDER_TITLE.into()),
            snippet: first_string(entry, SNIPPET_KEYS)
                .unwrap_or_else(|| PLACEHOLDER_SNIPPET.into()),
            url: first_string(entry, URL_KEYS).unwrap_or_else(|| PLACEHOLDER_URL.into()),
        }),
        Value::String(s) if !s.trim().is_empty() => Some(SearchItem {
            title: PLACEHOLDER_TITLE.into(),
            snippet: s.trim().to_string(),
            url: PLACEHOLDER_URL.into(),
        }),
        _ => {
            tracing::warn!(entry = %entry, "Skipping unusable search result entry");
            None
        }
    }
}

fn first_string(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
