//! Section boundary scanner.
//!
//! Headings are `\section{Title}` and `\section*{Title}`, optionally with a
//! `[short title]` argument. A section's heading runs from the backslash to
//! the closing brace of the title; its body runs from there to the next
//! heading, to `\end{document}`, or to the end of input. Everything before the
//! first heading is preamble and everything from `\end{document}` on is
//! closing material; neither belongs to any section.

use std::ops::Range;

use serde::Serialize;

use crate::document::scanner::{
    brace_group, bracket_group, environment_name, read_command, skip_whitespace, Lexer, Token,
};

/// Heading commands that open a top-level section.
const HEADING_COMMANDS: &[&str] = &["section"];

/// A named, contiguous span of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Normalised title used for lookup. Empty for the unnamed fallback section.
    pub name: String,
    /// Byte range of the heading command including its title group.
    pub heading: Range<usize>,
    /// Byte range of the content following the heading.
    pub body: Range<usize>,
}

impl Section {
    /// Whole span of the section, heading included.
    pub fn span(&self) -> Range<usize> {
        self.heading.start..self.body.end
    }

    pub fn is_unnamed(&self) -> bool {
        self.name.is_empty()
    }
}

/// Result of a single structural scan.
#[derive(Debug, Default)]
struct Scan {
    headings: Vec<(String, Range<usize>)>,
    malformed: Vec<usize>,
    document_end: Option<usize>,
}

fn scan(source: &str) -> Scan {
    let mut scan = Scan::default();
    // Tokens inside a heading's own title group are not structural.
    let mut resume_at = 0usize;

    for token in Lexer::new(source) {
        let Token::Command { name, start, end } = token else {
            continue;
        };
        if start < resume_at {
            continue;
        }

        if name == "begin" {
            // Headings seen so far live in preamble macro definitions.
            if let Some(("document", _)) = environment_name(source, end) {
                scan.headings.clear();
                scan.malformed.clear();
            }
            continue;
        }

        if name == "end" {
            if let Some(("document", _)) = environment_name(source, end) {
                scan.document_end = Some(start);
                break;
            }
            continue;
        }

        if !HEADING_COMMANDS.contains(&name) {
            continue;
        }

        match heading_title(source, end) {
            Some((title, heading_end)) => {
                let name = normalize_title(&source[title]);
                // An empty title cannot be addressed; it stays in the previous body.
                if name.is_empty() {
                    scan.malformed.push(start);
                } else {
                    scan.headings.push((name, start..heading_end));
                }
                resume_at = heading_end;
            }
            None => scan.malformed.push(start),
        }
    }

    scan
}

/// Parses `*`, `[short]` and `{Title}` after a heading command ending at `end`.
fn heading_title(source: &str, end: usize) -> Option<(Range<usize>, usize)> {
    let mut idx = end;
    if source.as_bytes().get(idx) == Some(&b'*') {
        idx += 1;
    }
    idx = skip_whitespace(source, idx);
    if let Some((_, after)) = bracket_group(source, idx) {
        idx = skip_whitespace(source, after);
    }
    brace_group(source, idx)
}

/// Splits `source` into its ordered sections.
///
/// Never fails: a document without recognisable headings comes back as a
/// single unnamed section spanning the whole input.
pub fn parse_sections(source: &str) -> Vec<Section> {
    let scan = scan(source);

    if scan.headings.is_empty() {
        return vec![Section {
            name: String::new(),
            heading: 0..0,
            body: 0..source.len(),
        }];
    }

    let limit = scan.document_end.unwrap_or(source.len());
    let starts: Vec<usize> = scan
        .headings
        .iter()
        .skip(1)
        .map(|(_, heading)| heading.start)
        .chain(std::iter::once(limit))
        .collect();

    scan.headings
        .into_iter()
        .zip(starts)
        .map(|((name, heading), body_end)| Section {
            body: heading.end..body_end.max(heading.end),
            name,
            heading,
        })
        .collect()
}

/// Offsets of heading commands without a title group or with an empty title.
pub fn malformed_headings(source: &str) -> Vec<usize> {
    scan(source).malformed
}

/// Finds a section by name: exact match first, then case-insensitive.
pub fn find_section<'s>(sections: &'s [Section], name: &str) -> Option<&'s Section> {
    let wanted = normalize_title(name);
    if wanted.is_empty() {
        return None;
    }
    sections
        .iter()
        .find(|s| s.name == wanted)
        .or_else(|| {
            let lowered = wanted.to_lowercase();
            sections.iter().find(|s| s.name.to_lowercase() == lowered)
        })
}

/// Reduces a raw heading title to a lookup name.
///
/// `\textbf{Work Experience}` → `Work Experience`, `R\&D` → `R&D`,
/// `\faBriefcase\ Experience` → `Experience`.
pub fn normalize_title(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        match bytes[i] {
            b'\\' => {
                if let Some((_, end)) = read_command(raw, i) {
                    i = end;
                    continue;
                }
                let escaped = raw[i + 1..].chars().next();
                match escaped {
                    Some(ch) if "&%$#_{}".contains(ch) => out.push(ch),
                    _ => out.push(' '),
                }
                i += 1 + escaped.map(char::len_utf8).unwrap_or(0);
            }
            b'{' | b'}' => i += 1,
            b'~' => {
                out.push(' ');
                i += 1;
            }
            _ => {
                let ch_len = raw[i..].chars().next().map(char::len_utf8).unwrap_or(1);
                out.push_str(&raw[i..i + ch_len]);
                i += ch_len;
            }
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "\\documentclass{article}\n\\begin{document}\n\\section{Education}\nBS CS\n\\section*{Work \\textbf{Experience}}\nEngineer at X\n\\end{document}\n";

    #[test]
    fn test_parses_sections_in_order() {
        let sections = parse_sections(RESUME);
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Education", "Work Experience"]);
        assert_eq!(&RESUME[sections[0].body.clone()], "\nBS CS\n");
        assert_eq!(&RESUME[sections[1].body.clone()], "\nEngineer at X\n");
    }

    #[test]
    fn test_body_stops_at_end_document() {
        let sections = parse_sections(RESUME);
        let last = sections.last().unwrap();
        assert!(RESUME[last.body.end..].starts_with("\\end{document}"));
    }

    #[test]
    fn test_sections_are_ordered_and_disjoint() {
        let sections = parse_sections(RESUME);
        for pair in sections.windows(2) {
            assert_eq!(pair[0].body.end, pair[1].heading.start);
        }
    }

    #[test]
    fn test_commented_heading_is_not_a_boundary() {
        let source = "\\section{Skills}\nRust\n% \\section{Old}\nGo\n";
        let sections = parse_sections(source);
        assert_eq!(sections.len(), 1);
        assert!(source[sections[0].body.clone()].contains("Go"));
    }

    #[test]
    fn test_sectionmark_is_not_a_heading() {
        let source = "\\sectionmark{x}\n\\section{Skills}\nRust\n";
        let sections = parse_sections(source);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Skills");
    }

    #[test]
    fn test_tolerates_whitespace_and_short_title() {
        let source = "\\section [Exp]  {Experience}  % trailing note\nbody\n";
        let sections = parse_sections(source);
        assert_eq!(sections[0].name, "Experience");
        assert!(source[sections[0].body.clone()].contains("body"));
    }

    #[test]
    fn test_no_headings_falls_back_to_unnamed_section() {
        let source = "Just some text with {braces}.";
        let sections = parse_sections(source);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_unnamed());
        assert_eq!(sections[0].body, 0..source.len());
    }

    #[test]
    fn test_malformed_heading_is_reported_not_parsed() {
        let source = "\\section Education\nBS\n\\section{Skills}\nRust\n";
        assert_eq!(malformed_headings(source), vec![0]);
        let sections = parse_sections(source);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Skills");
    }

    #[test]
    fn test_empty_title_is_malformed_and_stays_in_previous_body() {
        let source = "\\section{A}\nold\n\\section{}\nx\n\\section{B}\ny\n";
        assert_eq!(malformed_headings(source), vec![16]);

        let sections = parse_sections(source);
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(&source[sections[0].body.clone()], "\nold\n\\section{}\nx\n");
    }

    #[test]
    fn test_headings_in_preamble_macros_are_ignored() {
        let source = "\\newcommand{\\resumeSection}[1]{\\section{#1}}\n\\begin{document}\n\\section{Skills}\nRust\n\\end{document}";
        let sections = parse_sections(source);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Skills");
    }

    #[test]
    fn test_find_section_is_case_insensitive_fallback() {
        let sections = parse_sections(RESUME);
        assert_eq!(
            find_section(&sections, "education").map(|s| s.name.as_str()),
            Some("Education")
        );
        assert!(find_section(&sections, "Projects").is_none());
    }

    #[test]
    fn test_normalize_title_strips_formatting() {
        assert_eq!(normalize_title("\\textbf{Work   Experience}"), "Work Experience");
        assert_eq!(normalize_title("R\\&D"), "R&D");
        assert_eq!(normalize_title("\\faBriefcase\\ Experience"), "Experience");
        assert_eq!(normalize_title("Éducation~Supérieure"), "Éducation Supérieure");
    }
}
