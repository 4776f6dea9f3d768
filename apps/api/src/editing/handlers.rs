//! Axum route handlers for the Editing API.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::compile::repair::RepairReport;
use crate::document::{list_section_names, SectionSelector};
use crate::editing::apply::{apply, ApplyRequest};
use crate::editing::models::ProposalSession;
use crate::editing::proposal::propose;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProposeBody {
    #[serde(alias = "current_latex", alias = "latex_code")]
    pub latex: String,
    #[serde(alias = "command")]
    pub instruction: String,
    /// Absent or "Full Document" rewrites the whole source.
    #[serde(default, alias = "section_name", alias = "target_section")]
    pub section: Option<String>,
    /// Overrides the configured number of variants (1–5).
    pub variants: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyBody {
    pub session_id: String,
    pub candidate_id: String,
    #[serde(alias = "current_latex", alias = "latex_code")]
    pub latex: String,
    #[serde(default, alias = "section_name")]
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub session_id: Uuid,
    pub candidate_id: String,
    pub section: Option<String>,
    #[serde(flatten)]
    pub report: RepairReport,
}

/// Error response for a failed apply. Carries the caller's document back
/// unchanged so clients can keep rendering the last valid state.
#[derive(Debug)]
pub struct ApplyFailure {
    pub error: AppError,
    pub latex: String,
}

impl IntoResponse for ApplyFailure {
    fn into_response(self) -> Response {
        let (status, code, message) = self.error.parts();
        let mut body = AppError::body(code, &message);
        body["latex"] = json!(self.latex);
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SectionsBody {
    #[serde(alias = "latex_code")]
    pub latex: String,
}

#[derive(Debug, Serialize)]
pub struct SectionsResponse {
    pub sections: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/edits/propose
///
/// Returns a proposal session with candidate rewrites of one section.
/// The submitted document is never modified.
pub async fn handle_propose(
    State(state): State<AppState>,
    Json(body): Json<ProposeBody>,
) -> Result<Json<ProposalSession>, AppError> {
    if body.latex.trim().is_empty() {
        return Err(AppError::Validation("latex cannot be empty".to_string()));
    }

    let selector = SectionSelector::from_name(body.section.as_deref());
    let variants = body.variants.unwrap_or(state.config.proposal_variants);

    let session = propose(
        &body.latex,
        &body.instruction,
        &selector,
        variants,
        state.generator.as_ref(),
        &state.sessions,
    )
    .await?;

    Ok(Json(session.as_ref().clone()))
}

/// POST /api/v1/edits/apply
///
/// Splices the chosen candidate into the submitted document and self-heals
/// the result. On failure the submitted document is returned untouched.
pub async fn handle_apply(
    State(state): State<AppState>,
    Json(body): Json<ApplyBody>,
) -> Result<Json<ApplyResponse>, ApplyFailure> {
    let request = ApplyRequest {
        session_id: &body.session_id,
        candidate_id: &body.candidate_id,
        document: &body.latex,
        section_override: body.section.as_deref(),
    };

    match apply(
        &request,
        &state.sessions,
        state.config.max_repair_attempts,
        state.compiler.as_ref(),
        state.generator.as_ref(),
    )
    .await
    {
        Ok(outcome) => Ok(Json(ApplyResponse {
            session_id: outcome.session_id,
            candidate_id: outcome.candidate_id,
            section: outcome.section,
            report: RepairReport::from(&outcome.repair),
        })),
        Err(error) => Err(ApplyFailure {
            error,
            latex: body.latex.clone(),
        }),
    }
}

/// POST /api/v1/sections
///
/// Ordered section names of the submitted document.
pub async fn handle_list_sections(Json(body): Json<SectionsBody>) -> Json<SectionsResponse> {
    Json(SectionsResponse {
        sections: list_section_names(&body.latex),
    })
}
