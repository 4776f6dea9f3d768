//! Document model: addresses the sections of a LaTeX résumé by name.
//!
//! `extract_span` and `replace_span` operate on a section's *body* (the
//! content after its heading). Replacement is a pure byte splice: every byte
//! outside the addressed span is copied verbatim, so the round-trip law
//! `replace_span(doc, s, extract_span(doc, s)) == doc` holds exactly.

pub mod scanner;
pub mod sections;

use thiserror::Error;

pub use sections::{malformed_headings, parse_sections, Section};

use sections::find_section;

/// Sentinel name meaning "no scoping: the whole document".
pub const FULL_DOCUMENT: &str = "Full Document";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Section '{0}' not found in the current document")]
    SectionNotFound(String),
}

/// Which span of a document an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionSelector {
    FullDocument,
    Named(String),
}

impl SectionSelector {
    /// Absent, blank and "Full Document" selectors all mean the whole source.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") => SectionSelector::FullDocument,
            Some(n) if n.eq_ignore_ascii_case(FULL_DOCUMENT) => SectionSelector::FullDocument,
            Some(n) => SectionSelector::Named(n.to_string()),
        }
    }

    /// The section name, or `None` for the full document.
    pub fn section_name(&self) -> Option<&str> {
        match self {
            SectionSelector::FullDocument => None,
            SectionSelector::Named(name) => Some(name),
        }
    }

    /// Human label used in prompts and logs.
    pub fn label(&self) -> &str {
        self.section_name().unwrap_or(FULL_DOCUMENT)
    }
}

/// Locates the body range addressed by `selector`.
fn locate(source: &str, selector: &SectionSelector) -> Result<std::ops::Range<usize>, DocumentError> {
    match selector {
        SectionSelector::FullDocument => Ok(0..source.len()),
        SectionSelector::Named(name) => {
            let sections = parse_sections(source);
            find_section(&sections, name)
                .filter(|s| !s.is_unnamed())
                .map(|s| s.body.clone())
                .ok_or_else(|| DocumentError::SectionNotFound(name.clone()))
        }
    }
}

/// Returns the exact text of the addressed span.
pub fn extract_span<'a>(source: &'a str, selector: &SectionSelector) -> Result<&'a str, DocumentError> {
    locate(source, selector).map(|range| &source[range])
}

/// Produces a new document with only the addressed span replaced by `new_text`.
pub fn replace_span(
    source: &str,
    selector: &SectionSelector,
    new_text: &str,
) -> Result<String, DocumentError> {
    let range = locate(source, selector)?;

    let mut out = String::with_capacity(source.len() - range.len() + new_text.len());
    out.push_str(&source[..range.start]);
    out.push_str(new_text);
    out.push_str(&source[range.end..]);
    Ok(out)
}

/// Ordered names of the document's sections. Empty when no heading is found.
pub fn list_section_names(source: &str) -> Vec<String> {
    parse_sections(source)
        .into_iter()
        .filter(|s| !s.is_unnamed())
        .map(|s| s.name)
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Builds a document from (title word, body) pairs. Titles get an index
    /// suffix so every section name is distinct.
    fn build_document(parts: &[(String, String)], wrap: bool) -> String {
        let mut doc = String::new();
        if wrap {
            doc.push_str("\\documentclass{article}\n\\begin{document}\n");
        }
        for (i, (title, body)) in parts.iter().enumerate() {
            doc.push_str(&format!("\\section{{{title}{i}}}{body}"));
        }
        if wrap {
            doc.push_str("\\end{document}\n");
        }
        doc
    }

    fn document_parts() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("[A-Z][a-z]{1,8}", "[a-zA-Z0-9 ,.%\n{}]{0,40}"), 1..6)
    }

    proptest! {
        /// Property: replacing a span with its own extraction reproduces the document.
        #[test]
        fn round_trip_is_identity(parts in document_parts(), wrap in any::<bool>()) {
            let doc = build_document(&parts, wrap);
            for name in list_section_names(&doc) {
                let selector = SectionSelector::Named(name);
                let span = extract_span(&doc, &selector).unwrap();
                prop_assert_eq!(replace_span(&doc, &selector, span).unwrap(), doc.clone());
            }
        }

        /// Property: replacing one section never changes another section or the framing.
        #[test]
        fn replacement_is_isolated(
            parts in document_parts(),
            wrap in any::<bool>(),
            replacement in "[a-z ]{0,30}",
            pick in any::<prop::sample::Index>(),
        ) {
            let doc = build_document(&parts, wrap);
            let sections = parse_sections(&doc);
            let target = &sections[pick.index(sections.len())];
            let selector = SectionSelector::Named(target.name.clone());

            let updated = replace_span(&doc, &selector, &replacement).unwrap();

            let preamble = &doc[..sections[0].heading.start];
            let closing = &doc[sections.last().unwrap().body.end..];
            prop_assert!(updated.starts_with(preamble));
            prop_assert!(updated.ends_with(closing));

            for other in sections.iter().filter(|s| s.name != target.name) {
                let other_selector = SectionSelector::Named(other.name.clone());
                prop_assert_eq!(
                    extract_span(&updated, &other_selector).unwrap(),
                    &doc[other.body.clone()]
                );
            }
        }

        /// Property: the parser never panics on arbitrary input.
        #[test]
        fn parse_never_panics(input in "\\PC{0,200}") {
            let sections = parse_sections(&input);
            prop_assert!(!sections.is_empty());
        }
    }
}
