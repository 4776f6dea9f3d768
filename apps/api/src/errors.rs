use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::document::DocumentError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Section '{0}' not found in the current document")]
    SectionNotFound(String),

    #[error("Proposal session '{0}' not found or expired")]
    SessionNotFound(String),

    #[error("Candidate '{0}' not found in this session")]
    CandidateNotFound(String),

    #[error("Proposal failed: {0}")]
    ProposalFailed(String),

    #[error("Generative service unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status, machine-readable code and client-facing message.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::SectionNotFound(_) => {
                (StatusCode::NOT_FOUND, "SECTION_NOT_FOUND", self.to_string())
            }
            AppError::SessionNotFound(_) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", self.to_string())
            }
            AppError::CandidateNotFound(_) => {
                (StatusCode::NOT_FOUND, "CANDIDATE_NOT_FOUND", self.to_string())
            }
            AppError::ProposalFailed(msg) => {
                tracing::warn!("Proposal failed: {msg}");
                (StatusCode::BAD_GATEWAY, "PROPOSAL_FAILED", self.to_string())
            }
            AppError::GatewayUnavailable(msg) => {
                tracing::error!("Generative service unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "GATEWAY_UNAVAILABLE",
                    "The generative service is temporarily unavailable".to_string(),
                )
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }

    /// The `{"error": {"code", "message"}}` body.
    pub fn body(code: &str, message: &str) -> Value {
        json!({
            "error": {
                "code": code,
                "message": message
            }
        })
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::SectionNotFound(name) => AppError::SectionNotFound(name),
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        if err.is_unavailable() {
            AppError::GatewayUnavailable(err.to_string())
        } else {
            AppError::Llm(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, Json(AppError::body(code, &message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::SectionNotFound("X".into()), StatusCode::NOT_FOUND),
            (AppError::SessionNotFound("s".into()), StatusCode::NOT_FOUND),
            (AppError::CandidateNotFound("c9".into()), StatusCode::NOT_FOUND),
            (AppError::ProposalFailed("none".into()), StatusCode::BAD_GATEWAY),
            (AppError::GatewayUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.parts().0, status);
        }
    }

    #[test]
    fn test_llm_errors_split_by_availability() {
        let down = AppError::from(LlmError::RateLimited { retries: 3 });
        assert!(matches!(down, AppError::GatewayUnavailable(_)));

        let garbled = AppError::from(LlmError::EmptyContent);
        assert!(matches!(garbled, AppError::Llm(_)));
    }

    #[test]
    fn test_document_error_maps_to_section_not_found() {
        let err = AppError::from(DocumentError::SectionNotFound("Awards".into()));
        let (_, code, message) = err.parts();
        assert_eq!(code, "SECTION_NOT_FOUND");
        assert!(message.contains("Awards"));
    }
}
