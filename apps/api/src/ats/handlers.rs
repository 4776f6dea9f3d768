//! Axum route handler for the ATS API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::ats::AtsReport;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
    #[serde(alias = "resume_text", alias = "latex")]
    pub resume: String,
    #[serde(alias = "jd", alias = "jd_text")]
    pub job_description: String,
}

/// POST /api/v1/ats/score
pub async fn handle_score(
    State(state): State<AppState>,
    Json(body): Json<ScoreBody>,
) -> Result<Json<AtsReport>, AppError> {
    if body.job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }
    if body.resume.trim().is_empty() {
        return Err(AppError::Validation("resume cannot be empty".to_string()));
    }

    Ok(Json(state.ats.score(&body.resume, &body.job_description).await))
}
