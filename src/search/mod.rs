pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod types;

pub use extract::{classify_response, extract_items};
pub use orchestrator::SearchOrchestrator;
pub use types::{
    HandlerOutcome, NormalizedSearchResult, SearchItem, SearchQuery, ToolInvocationResult,
};
