//! Axum route handlers for the Compile API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::compile::repair::{compile_with_repair, RepairOutcome, RepairReport};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    #[serde(alias = "latex_code")]
    pub latex: String,
    /// Run the self-healing loop instead of a single compile.
    #[serde(default)]
    pub repair: bool,
    /// Overrides the configured repair budget (still clamped to the ceiling).
    pub max_attempts: Option<u32>,
}

/// POST /api/v1/compile
///
/// A failed compile is still a 200: the body carries `ok = false` and the log.
pub async fn handle_compile(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> Result<Json<RepairReport>, AppError> {
    if request.latex.trim().is_empty() {
        return Err(AppError::Validation("latex cannot be empty".to_string()));
    }

    let outcome = if request.repair {
        let budget = request
            .max_attempts
            .unwrap_or(state.config.max_repair_attempts);
        compile_with_repair(
            &request.latex,
            budget,
            state.compiler.as_ref(),
            state.generator.as_ref(),
        )
        .await
    } else {
        let result = state.compiler.compile(&request.latex).await;
        RepairOutcome::single(&request.latex, result)
    };

    Ok(Json(RepairReport::from(&outcome)))
}
