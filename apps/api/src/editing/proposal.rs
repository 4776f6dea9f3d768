//! Edit Proposal Engine: turns an instruction into a session of candidate
//! rewrites for one section. Read-only with respect to the document.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::sections::normalize_title;
use crate::document::{extract_span, parse_sections, SectionSelector};
use crate::editing::models::{Candidate, ProposalSession};
use crate::editing::prompts::{PROPOSAL_INSTRUCTION_TEMPLATE, PROPOSAL_SYSTEM};
use crate::editing::session_store::SessionStore;
use crate::errors::AppError;
use crate::llm_client::prompts::LATEX_PRESERVATION_INSTRUCTION;
use crate::llm_client::{
    fill_template, strip_code_fences, GeneratedText, GenerationRequest, TextGenerator,
};

pub const DEFAULT_VARIANT_COUNT: usize = 3;
pub const MAX_VARIANT_COUNT: usize = 5;

fn proposal_request(instruction: &str, selector: &SectionSelector, span: &str, count: usize) -> GenerationRequest {
    let scope = match selector.section_name() {
        Some(name) => format!("the body of the \"{name}\" section"),
        None => "the complete source".to_string(),
    };
    GenerationRequest {
        system: PROPOSAL_SYSTEM,
        instruction: fill_template(
            PROPOSAL_INSTRUCTION_TEMPLATE,
            &[
                ("instruction", instruction),
                ("scope", scope.as_str()),
                ("count", count.to_string().as_str()),
                ("preservation", LATEX_PRESERVATION_INSTRUCTION),
            ],
        ),
        context: span.to_string(),
        count,
    }
}

/// Drops a leading `\section{..}` the model echoed back for the section it was
/// asked to rewrite, so splicing never duplicates the heading.
fn strip_echoed_heading(text: &str, section: Option<&str>) -> String {
    let Some(section) = section else {
        return text.to_string();
    };
    let parsed = parse_sections(text);
    match parsed.first() {
        Some(first)
            if !first.is_unnamed()
                && text[..first.heading.start].trim().is_empty()
                && first.name.to_lowercase() == normalize_title(section).to_lowercase() =>
        {
            text[first.heading.end..].to_string()
        }
        _ => text.to_string(),
    }
}

/// Filters raw outputs into at most `count` usable candidates with ids `c1..cN`.
/// Empty and duplicate texts are dropped.
pub fn collect_candidates(outputs: Vec<GeneratedText>, section: Option<&str>, count: usize) -> Vec<Candidate> {
    let mut seen: Vec<String> = Vec::new();
    let mut candidates = Vec::new();

    for output in outputs {
        if candidates.len() == count {
            break;
        }
        let text = strip_echoed_heading(strip_code_fences(&output.text), section);
        let key = text.trim().to_string();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let n = candidates.len() + 1;
        candidates.push(Candidate {
            id: format!("c{n}"),
            intent: if output.label.trim().is_empty() {
                format!("Variant {n}")
            } else {
                output.label.trim().to_string()
            },
            summary: output.summary.trim().to_string(),
            latex: text,
        });
    }

    candidates
}

/// Generates a proposal session for `instruction` scoped to `selector` and
/// stores it. `SectionNotFound` is returned before any generative call.
pub async fn propose(
    document: &str,
    instruction: &str,
    selector: &SectionSelector,
    variant_count: usize,
    generator: &dyn TextGenerator,
    store: &SessionStore,
) -> Result<Arc<ProposalSession>, AppError> {
    if instruction.trim().is_empty() {
        return Err(AppError::Validation("instruction cannot be empty".to_string()));
    }
    let count = variant_count.clamp(1, MAX_VARIANT_COUNT);

    let span = extract_span(document, selector)?;
    let request = proposal_request(instruction.trim(), selector, span, count);

    let outputs = generator
        .generate(&request)
        .await
        .map_err(|e| AppError::ProposalFailed(format!("generative service error: {e}")))?;

    let candidates = collect_candidates(outputs, selector.section_name(), count);
    if candidates.is_empty() {
        return Err(AppError::ProposalFailed(
            "the generative service returned no usable candidates".to_string(),
        ));
    }
    if candidates.len() < count {
        warn!(
            "Requested {} candidates for '{}', {} usable",
            count,
            selector.label(),
            candidates.len()
        );
    }

    let session = store.insert(ProposalSession {
        id: Uuid::new_v4(),
        instruction: instruction.trim().to_string(),
        target_section: selector.section_name().map(str::to_string),
        snapshot: document.to_string(),
        candidates,
        created_at: Utc::now(),
    });

    info!(
        "Proposal session {} created for '{}' with {} candidate(s), {} live session(s)",
        session.id,
        selector.label(),
        session.candidates.len(),
        store.len()
    );
    Ok(session)
}
