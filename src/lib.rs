//! Groundsearch - web search microservice backed by Gemini's search tool
//!
//! This library exposes the request pipeline (validation, orchestration,
//! response composition) so integration tests can drive it with a stub
//! completion service.

pub mod compose;
pub mod config;
pub mod error;
pub mod handlers;
pub mod provider;
pub mod search;
pub mod state;

// Re-export key types for convenience
pub use config::{Config, SearchStrategy};
pub use error::{AppError, Result};
pub use handlers::{health_handler, ready_handler, search_handler};
pub use provider::{CompletionService, GeminiClient};
pub use search::{HandlerOutcome, SearchOrchestrator};
pub use state::AppState;
