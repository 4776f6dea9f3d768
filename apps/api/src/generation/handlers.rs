//! Axum route handlers for the Generation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::compile::repair::RepairReport;
use crate::errors::AppError;
use crate::generation::generator::{generate_resume, squeeze_layout, GeneratedResume};
use crate::generation::templates::{find_template, Template, DEFAULT_TEMPLATE, TEMPLATES};
use crate::state::AppState;
use crate::validation::{check_health, HealthReport};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub bio: String,
    #[serde(default = "default_template", alias = "template_name")]
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct SqueezeBody {
    #[serde(alias = "latex_code")]
    pub latex: String,
}

/// A generated or rewritten document, its compile outcome and a static health check.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub summary: String,
    pub health: HealthReport,
    #[serde(flatten)]
    pub report: RepairReport,
}

impl From<GeneratedResume> for DocumentResponse {
    fn from(generated: GeneratedResume) -> Self {
        Self {
            summary: generated.summary,
            health: check_health(&generated.repair.final_source),
            report: RepairReport::from(&generated.repair),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: &'static [Template],
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/generate
///
/// Fills a built-in template from a free-text bio and self-heals the result.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<DocumentResponse>, AppError> {
    if body.bio.trim().is_empty() {
        return Err(AppError::Validation("bio cannot be empty".to_string()));
    }
    let template = find_template(&body.template)
        .ok_or_else(|| AppError::NotFound(format!("Template '{}' does not exist", body.template)))?;

    let generated = generate_resume(
        &body.bio,
        template,
        state.config.max_repair_attempts,
        state.generator.as_ref(),
        state.compiler.as_ref(),
    )
    .await?;

    Ok(Json(generated.into()))
}

/// POST /api/v1/resumes/squeeze
///
/// Rewrites the whole document for a denser layout and self-heals the result.
pub async fn handle_squeeze(
    State(state): State<AppState>,
    Json(body): Json<SqueezeBody>,
) -> Result<Json<DocumentResponse>, AppError> {
    if body.latex.trim().is_empty() {
        return Err(AppError::Validation("latex cannot be empty".to_string()));
    }

    let squeezed = squeeze_layout(
        &body.latex,
        state.config.max_repair_attempts,
        state.generator.as_ref(),
        state.compiler.as_ref(),
    )
    .await?;

    Ok(Json(squeezed.into()))
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<TemplatesResponse> {
    Json(TemplatesResponse {
        templates: TEMPLATES,
    })
}
