pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ats::handlers as ats;
use crate::compile::handlers as compile;
use crate::editing::handlers as editing;
use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::validation::handlers as validation;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Generation API
        .route("/api/v1/templates", get(generation::handle_list_templates))
        .route("/api/v1/resumes/generate", post(generation::handle_generate))
        .route("/api/v1/resumes/squeeze", post(generation::handle_squeeze))
        // Editing API
        .route("/api/v1/sections", post(editing::handle_list_sections))
        .route("/api/v1/edits/propose", post(editing::handle_propose))
        .route("/api/v1/edits/apply", post(editing::handle_apply))
        // Compile / validation API
        .route("/api/v1/compile", post(compile::handle_compile))
        .route("/api/v1/validate", post(validation::handle_validate))
        .route("/api/v1/format", post(validation::handle_format))
        // ATS API
        .route("/api/v1/ats/score", post(ats::handle_score))
        .with_state(state)
}
