use std::sync::Arc;

use crate::ats::AtsScorer;
use crate::compile::LatexCompiler;
use crate::config::Config;
use crate::editing::session_store::SessionStore;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generative service. Production: `LlmClient`.
    pub generator: Arc<dyn TextGenerator>,
    /// LaTeX engine. Production: `ProcessCompiler`.
    pub compiler: Arc<dyn LatexCompiler>,
    /// The only shared mutable state in the service.
    pub sessions: Arc<SessionStore>,
    pub ats: Arc<AtsScorer>,
    pub config: Config,
}
