use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::document::SectionSelector;

/// One proposed rewrite of a session's target span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Unique within its session: `c1`, `c2`, ...
    pub id: String,
    pub intent: String,
    pub summary: String,
    /// Literal replacement for the target span.
    pub latex: String,
}

/// A set of candidates generated for one instruction against one document snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalSession {
    #[serde(rename = "session_id")]
    pub id: Uuid,
    pub instruction: String,
    /// `None` means the whole document.
    pub target_section: Option<String>,
    /// Document as it was when the session was created.
    #[serde(skip_serializing)]
    pub snapshot: String,
    pub candidates: Vec<Candidate>,
    pub created_at: DateTime<Utc>,
}

impl ProposalSession {
    pub fn candidate(&self, id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn selector(&self) -> SectionSelector {
        SectionSelector::from_name(self.target_section.as_deref())
    }
}
