//! Axum route handlers for the Validation API. Both are pure and synchronous.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::validation::{check_health, format_latex, HealthReport};

#[derive(Debug, Deserialize)]
pub struct LatexBody {
    #[serde(alias = "latex_code")]
    pub latex: String,
}

#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub latex: String,
}

/// POST /api/v1/validate
pub async fn handle_validate(Json(body): Json<LatexBody>) -> Json<HealthReport> {
    Json(check_health(&body.latex))
}

/// POST /api/v1/format
pub async fn handle_format(Json(body): Json<LatexBody>) -> Json<FormatResponse> {
    Json(FormatResponse {
        latex: format_latex(&body.latex),
    })
}
