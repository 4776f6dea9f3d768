//! Apply Engine: splices a chosen candidate into the caller's current
//! document and runs the self-healing compiler on the result.
//!
//! All or nothing. The store is only read, and the caller receives either a new
//! document with its compile outcome or an error with nothing changed.

use tracing::{debug, info};
use uuid::Uuid;

use crate::compile::{compile_with_repair, LatexCompiler, RepairOutcome};
use crate::document::scanner::{Lexer, Token};
use crate::document::{extract_span, replace_span, DocumentError, SectionSelector};
use crate::editing::session_store::SessionStore;
use crate::errors::AppError;
use crate::llm_client::TextGenerator;

#[derive(Debug, Clone)]
pub struct ApplyRequest<'a> {
    pub session_id: &'a str,
    pub candidate_id: &'a str,
    pub document: &'a str,
    /// Retargets the splice; defaults to the session's recorded section.
    pub section_override: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub session_id: Uuid,
    pub candidate_id: String,
    pub section: Option<String>,
    /// Spliced (and possibly repaired) document plus its compile result.
    pub repair: RepairOutcome,
}

/// True when `text` ends inside a `%` comment, which would swallow whatever
/// follows it on the same line.
fn ends_in_comment(text: &str) -> bool {
    Lexer::new(text)
        .filter_map(|token| match token {
            Token::Comment { end, .. } => Some(end),
            _ => None,
        })
        .last()
        .is_some_and(|end| end == text.len())
}

/// Carries the original span's leading and trailing whitespace over to the
/// replacement so a heading never fuses with the first line of its body.
pub fn fit_to_span(original: &str, replacement: &str) -> String {
    let trimmed = replacement.trim();
    if original.trim().is_empty() {
        return format!("\n{trimmed}\n");
    }
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    if !trailing.contains('\n') && ends_in_comment(trimmed) {
        return format!("{leading}{trimmed}\n{trailing}");
    }
    format!("{leading}{trimmed}{trailing}")
}

/// Replaces the selected span of `document` with `replacement`, fitted to the span.
pub fn splice_candidate(
    document: &str,
    selector: &SectionSelector,
    replacement: &str,
) -> Result<String, DocumentError> {
    let original = extract_span(document, selector)?;
    replace_span(document, selector, &fit_to_span(original, replacement))
}

pub async fn apply(
    request: &ApplyRequest<'_>,
    sessions: &SessionStore,
    max_repair_attempts: u32,
    compiler: &dyn LatexCompiler,
    generator: &dyn TextGenerator,
) -> Result<ApplyOutcome, AppError> {
    let session_id = Uuid::parse_str(request.session_id.trim())
        .map_err(|_| AppError::SessionNotFound(request.session_id.to_string()))?;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| AppError::SessionNotFound(request.session_id.to_string()))?;
    let candidate = session
        .candidate(request.candidate_id.trim())
        .ok_or_else(|| AppError::CandidateNotFound(request.candidate_id.to_string()))?;

    let selector = match request.section_override {
        Some(name) => SectionSelector::from_name(Some(name)),
        None => session.selector(),
    };

    if request.document != session.snapshot {
        debug!("Document changed since session {} was proposed", session.id);
    }

    let spliced = splice_candidate(request.document, &selector, &candidate.latex)?;

    info!(
        "Applying candidate {} of session {} to '{}'",
        candidate.id,
        session.id,
        selector.label()
    );
    let repair = compile_with_repair(&spliced, max_repair_attempts, compiler, generator).await;

    Ok(ApplyOutcome {
        session_id: session.id,
        candidate_id: candidate.id.clone(),
        section: selector.section_name().map(str::to_string),
        repair,
    })
}
