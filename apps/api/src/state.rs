use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::ReasoningService;
use crate::vocabulary::Vocabulary;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Reasoning service backend. `LlmClient` in production, stubs in tests.
    pub llm: Arc<dyn ReasoningService>,
    /// Read-only vocabularies, built once at startup.
    pub vocab: Arc<Vocabulary>,
    pub config: Config,
}
