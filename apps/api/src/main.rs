mod ats;
mod compile;
mod config;
mod document;
mod editing;
mod errors;
mod generation;
mod llm_client;
mod routes;
mod state;
mod validation;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ats::embeddings::{Embedder, GeminiEmbedder};
use crate::ats::AtsScorer;
use crate::compile::ProcessCompiler;
use crate::config::Config;
use crate::editing::session_store::SessionStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing or invalid env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resumetex v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize LaTeX engine
    let compiler = ProcessCompiler::new(
        config.latex_engine,
        config.latex_bin.clone(),
        config.compile_timeout,
    );
    info!(
        "LaTeX engine: {} ({}), timeout {}s, repair budget {}",
        config.latex_engine,
        config.latex_bin,
        config.compile_timeout.as_secs(),
        config.max_repair_attempts
    );

    // Initialize ATS scorer (semantic only when GEMINI_API_KEY is set)
    let embedder = config
        .gemini_api_key
        .clone()
        .map(|key| Arc::new(GeminiEmbedder::new(key)) as Arc<dyn Embedder>);
    info!(
        "ATS scorer: {}",
        if embedder.is_some() { "semantic+keyword" } else { "keyword" }
    );

    let sessions = SessionStore::new(config.session_ttl, config.session_capacity);

    // Build app state
    let state = AppState {
        generator: Arc::new(llm),
        compiler: Arc::new(compiler),
        sessions: Arc::new(sessions),
        ats: Arc::new(AtsScorer::new(embedder)),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
