//! ATS Match Scorer: how well a résumé covers a job description.
//!
//! Lexical keyword coverage always runs. When an `Embedder` is configured the
//! score blends in semantic similarity (60% semantic, 40% keyword); if the
//! embedding call fails the report degrades to keyword-only instead of erroring.

pub mod embeddings;
pub mod handlers;
pub mod keywords;

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use embeddings::{cosine_similarity, Embedder, EmbeddingError};
use keywords::{extract_keywords, keyword_overlap, latex_to_plain};

const SEMANTIC_WEIGHT: f64 = 0.6;
const KEYWORD_WEIGHT: f64 = 0.4;
const MAX_LISTED_KEYWORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtsReport {
    /// Percentages in [0, 100], rounded to two decimals.
    pub total_score: f64,
    pub semantic_match: Option<f64>,
    pub keyword_match: f64,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub scorer_backend: String, // "semantic+keyword" | "keyword"
}

fn percent(fraction: f64) -> f64 {
    (fraction.clamp(0.0, 1.0) * 10_000.0).round() / 100.0
}

pub struct AtsScorer {
    embedder: Option<Arc<dyn Embedder>>,
}

impl AtsScorer {
    pub fn new(embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self { embedder }
    }

    pub fn keyword_only() -> Self {
        Self { embedder: None }
    }

    async fn semantic_similarity(
        embedder: &dyn Embedder,
        resume: &str,
        jd: &str,
    ) -> Result<f64, EmbeddingError> {
        let (resume_vec, jd_vec) = tokio::try_join!(embedder.embed(resume), embedder.embed(jd))?;
        cosine_similarity(&resume_vec, &jd_vec)
    }

    /// Scores `resume` (LaTeX or plain text) against `job_description`.
    pub async fn score(&self, resume: &str, job_description: &str) -> AtsReport {
        let resume_text = latex_to_plain(resume);

        let overlap = keyword_overlap(
            &extract_keywords(&resume_text),
            &extract_keywords(job_description),
        );

        let semantic = match &self.embedder {
            Some(embedder) => {
                match Self::semantic_similarity(embedder.as_ref(), &resume_text, job_description).await {
                    Ok(similarity) => Some(similarity.max(0.0)),
                    Err(e) => {
                        warn!("Embedding failed, falling back to keyword-only ATS score: {e}");
                        None
                    }
                }
            }
            None => None,
        };

        let (total, backend) = match semantic {
            Some(s) => (SEMANTIC_WEIGHT * s + KEYWORD_WEIGHT * overlap.score, "semantic+keyword"),
            None => (overlap.score, "keyword"),
        };

        AtsReport {
            total_score: percent(total),
            semantic_match: semantic.map(percent),
            keyword_match: percent(overlap.score),
            matched_keywords: overlap.matched.into_iter().take(MAX_LISTED_KEYWORDS).collect(),
            missing_keywords: overlap.missing.into_iter().take(MAX_LISTED_KEYWORDS).collect(),
            scorer_backend: backend.to_string(),
        }
    }
}
