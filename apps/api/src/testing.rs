//! In-memory stand-ins for the generative service and the LaTeX engine, plus
//! an `AppState` builder for router tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::ats::AtsScorer;
use crate::compile::{CompileResult, LatexCompiler, LatexEngine};
use crate::config::Config;
use crate::editing::session_store::SessionStore;
use crate::llm_client::{GeneratedText, GenerationRequest, LlmError, TextGenerator};
use crate::state::AppState;

pub fn generated(label: &str, summary: &str, text: &str) -> GeneratedText {
    GeneratedText {
        text: text.to_string(),
        label: label.to_string(),
        summary: summary.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generative service
// ────────────────────────────────────────────────────────────────────────────

/// Replays queued responses in order. Once the queue is empty it repeats the
/// `repeat` response, or fails with `EmptyContent` if there is none.
#[derive(Default)]
pub struct ScriptedGenerator {
    queue: Mutex<VecDeque<Result<Vec<GeneratedText>, LlmError>>>,
    repeat: Option<Vec<GeneratedText>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<Result<Vec<GeneratedText>, LlmError>>) -> Self {
        Self {
            queue: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Answers every call with the same outputs.
    pub fn repeating(texts: Vec<GeneratedText>) -> Self {
        Self {
            repeat: Some(texts),
            ..Self::default()
        }
    }

    /// Fails every call as if the service were down.
    pub fn unavailable() -> Self {
        Self::new(
            (0..8)
                .map(|_| {
                    Err(LlmError::Api {
                        status: 503,
                        message: "overloaded".to_string(),
                    })
                })
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedText>, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(response) = self.queue.lock().unwrap().pop_front() {
            return response;
        }
        self.repeat.clone().ok_or(LlmError::EmptyContent)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LaTeX engine
// ────────────────────────────────────────────────────────────────────────────

/// Succeeds iff every `\begin{` has a matching `\end{` and the source does not
/// contain `\undefined`. Records every source it was asked to compile.
#[derive(Default)]
pub struct ScriptedCompiler {
    sources: Mutex<Vec<String>>,
}

impl ScriptedCompiler {
    pub fn calls(&self) -> usize {
        self.sources.lock().unwrap().len()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

#[async_trait]
impl LatexCompiler for ScriptedCompiler {
    async fn compile(&self, source: &str) -> CompileResult {
        self.sources.lock().unwrap().push(source.to_string());

        let begins = source.matches("\\begin{").count();
        let ends = source.matches("\\end{").count();
        if begins != ends {
            return CompileResult::failure(format!(
                "! LaTeX Error: {begins} \\begin but {ends} \\end.\nl.1 \\end{{document}}"
            ));
        }
        if source.contains("\\undefined") {
            return CompileResult::failure("! Undefined control sequence.\nl.1 \\undefined");
        }
        CompileResult::success(Bytes::from_static(b"%PDF-1.7 scripted"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Application state
// ────────────────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        anthropic_api_key: "test-key".to_string(),
        gemini_api_key: None,
        port: 0,
        rust_log: "debug".to_string(),
        latex_engine: LatexEngine::Tectonic,
        latex_bin: "tectonic".to_string(),
        compile_timeout: Duration::from_secs(5),
        max_repair_attempts: 3,
        proposal_variants: 3,
        session_ttl: Duration::from_secs(1800),
        session_capacity: 16,
    }
}

pub fn test_state(generator: Arc<ScriptedGenerator>, compiler: Arc<ScriptedCompiler>) -> AppState {
    let config = test_config();
    AppState {
        generator,
        compiler,
        sessions: Arc::new(SessionStore::new(config.session_ttl, config.session_capacity)),
        ats: Arc::new(AtsScorer::keyword_only()),
        config,
    }
}
