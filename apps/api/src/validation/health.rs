//! Static health check: a cheap, compile-free signal for how likely a
//! document is to build. Never calls the compiler or the generative service.

use serde::Serialize;

use crate::document::scanner::{
    bracket_group, brace_group, environment_name, is_blank_latex, skip_whitespace, Lexer, Token,
};
use crate::document::{malformed_headings, parse_sections};

/// Score above which a document counts as healthy.
pub const HEALTHY_THRESHOLD: u32 = 70;

const BRACE_PENALTY: u32 = 40;
const ENVIRONMENT_PENALTY: u32 = 40;
const RESERVED_CHARACTER_PENALTY: (u32, u32) = (5, 20);
const EMPTY_SECTION_PENALTY: (u32, u32) = (5, 15);
const MALFORMED_HEADING_PENALTY: (u32, u32) = (10, 20);
const MISSING_BODY_PENALTY: u32 = 20;

/// Environments in which `&` is a column separator.
const ALIGNMENT_ENVIRONMENTS: &[&str] = &[
    "tabular", "tabular*", "tabularx", "tabulary", "longtable", "array", "align", "align*",
    "alignat", "alignat*", "aligned", "eqnarray", "eqnarray*", "split", "cases", "matrix",
    "pmatrix", "bmatrix", "vmatrix", "Vmatrix", "smallmatrix",
];

/// Environments whose content is typeset in math mode.
const MATH_ENVIRONMENTS: &[&str] = &[
    "math", "displaymath", "equation", "equation*", "align", "align*", "alignat", "alignat*",
    "gather", "gather*", "multline", "multline*", "eqnarray", "eqnarray*",
];

/// Commands whose first argument is a path, URL or key where `_`, `#`, `%`
/// and `&` are literal.
const LITERAL_ARGUMENT_COMMANDS: &[&str] = &[
    "url", "href", "includegraphics", "input", "include", "label", "ref", "eqref", "cite",
    "usepackage", "documentclass", "hypersetup",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnbalancedBraces,
    UnbalancedEnvironments,
    UnescapedCharacter,
    EmptySection,
    MalformedHeading,
    MissingDocumentBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub offset: usize,
    /// 1-based.
    pub line: usize,
    /// 1-based, in characters.
    pub column: usize,
}

impl Location {
    fn at(source: &str, offset: usize) -> Self {
        let before = &source[..offset];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Self {
            offset,
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthIssue {
    pub kind: IssueKind,
    pub message: String,
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub is_healthy: bool,
    pub score: u32,
    pub issues: Vec<HealthIssue>,
}

impl HealthReport {
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

struct Checker<'a> {
    source: &'a str,
    issues: Vec<HealthIssue>,
}

impl<'a> Checker<'a> {
    fn push(&mut self, kind: IssueKind, message: String, offset: Option<usize>) {
        self.issues.push(HealthIssue {
            kind,
            message,
            location: offset.map(|o| Location::at(self.source, o)),
        });
    }
}

#[derive(Default)]
struct MathState {
    /// Offset of the `$` that opened inline math.
    dollar: Option<usize>,
    /// Offset of the `$$` that opened display math.
    display: Option<usize>,
    /// Nesting of `\(`/`\[`.
    delimited: usize,
}

impl MathState {
    fn active(&self, environments: &[(&str, usize)]) -> bool {
        self.dollar.is_some()
            || self.display.is_some()
            || self.delimited > 0
            || environments.iter().any(|(env, _)| MATH_ENVIRONMENTS.contains(env))
    }
}

fn toggle(open: Option<usize>, pos: usize) -> Option<usize> {
    match open {
        Some(_) => None,
        None => Some(pos),
    }
}

/// Skips a literal-argument command's `[opts]{arg}`, returning the offset past it.
fn literal_argument_end(source: &str, command_end: usize) -> Option<usize> {
    let mut idx = skip_whitespace(source, command_end);
    if let Some((_, after)) = bracket_group(source, idx) {
        idx = skip_whitespace(source, after);
    }
    brace_group(source, idx).map(|(_, end)| end)
}

/// Scores `source` by static inspection.
pub fn check_health(source: &str) -> HealthReport {
    let mut checker = Checker {
        source,
        issues: Vec::new(),
    };
    let bytes = source.as_bytes();

    let mut braces: Vec<usize> = Vec::new();
    let mut environments: Vec<(&str, usize)> = Vec::new();
    let mut math = MathState::default();
    let mut has_documentclass = false;
    let mut body_start: Option<usize> = None;
    let mut body_end: Option<usize> = None;
    let mut literal_until = 0usize;
    let mut skip_dollar: Option<usize> = None;
    let mut reserved = 0u32;
    let has_body = Lexer::new(source).any(|token| match token {
        Token::Command { name: "begin", end, .. } => {
            matches!(environment_name(source, end), Some(("document", _)))
        }
        _ => false,
    });

    for token in Lexer::new(source) {
        // Reserved characters are only judged inside the document body, or
        // everywhere for a fragment with neither `\documentclass` nor a body.
        let (start_at, end_at, fragment, literal) =
            (body_start, body_end, !has_documentclass && !has_body, literal_until);
        let in_body = move |pos: usize| {
            end_at.map_or(true, |end| pos < end)
                && start_at.map_or(fragment, |start| pos >= start)
                && pos >= literal
        };

        match token {
            Token::Special { ch: b'{', pos } => braces.push(pos),
            Token::Special { ch: b'}', pos } => {
                if braces.pop().is_none() {
                    checker.push(
                        IssueKind::UnbalancedBraces,
                        "Unexpected closing brace".to_string(),
                        Some(pos),
                    );
                }
            }
            Token::Command { name: "begin", start, end } => {
                let Some((env, _)) = environment_name(source, end) else {
                    continue;
                };
                if env == "document" {
                    body_start = Some(start);
                }
                environments.push((env, start));
            }
            Token::Command { name: "end", start, end } => {
                let Some((env, _)) = environment_name(source, end) else {
                    continue;
                };
                if env == "document" {
                    body_end = Some(start);
                }
                match environments.iter().rposition(|(open, _)| *open == env) {
                    Some(idx) => {
                        for (unclosed, at) in environments.drain(idx + 1..).collect::<Vec<_>>() {
                            checker.push(
                                IssueKind::UnbalancedEnvironments,
                                format!("\\begin{{{unclosed}}} is closed by \\end{{{env}}}"),
                                Some(at),
                            );
                        }
                        environments.pop();
                    }
                    None => checker.push(
                        IssueKind::UnbalancedEnvironments,
                        format!("\\end{{{env}}} without a matching \\begin{{{env}}}"),
                        Some(start),
                    ),
                }
            }
            Token::Command { name: "documentclass", .. } => has_documentclass = true,
            Token::Command { name, end, .. } if LITERAL_ARGUMENT_COMMANDS.contains(&name) => {
                if let Some(after) = literal_argument_end(source, end) {
                    literal_until = literal_until.max(after);
                }
            }
            Token::Symbol { ch: b'(' | b'[', .. } => math.delimited += 1,
            Token::Symbol { ch: b')' | b']', .. } => {
                math.delimited = math.delimited.saturating_sub(1)
            }
            Token::Special { ch: b'$', pos } => {
                if skip_dollar == Some(pos) {
                    continue;
                }
                if bytes.get(pos + 1) == Some(&b'$') {
                    skip_dollar = Some(pos + 1);
                    math.display = toggle(math.display, pos);
                } else {
                    math.dollar = toggle(math.dollar, pos);
                }
            }
            Token::Special { ch: b'&', pos } if in_body(pos) => {
                let aligned = environments
                    .iter()
                    .any(|(env, _)| ALIGNMENT_ENVIRONMENTS.contains(env));
                if !aligned {
                    reserved += 1;
                    checker.push(
                        IssueKind::UnescapedCharacter,
                        "Unescaped '&' outside a tabular or alignment environment (use \\&)"
                            .to_string(),
                        Some(pos),
                    );
                }
            }
            Token::Special { ch: b'#', pos } if in_body(pos) => {
                let parameter = bytes
                    .get(pos + 1)
                    .is_some_and(|b| b.is_ascii_digit() || *b == b'#');
                if !parameter {
                    reserved += 1;
                    checker.push(
                        IssueKind::UnescapedCharacter,
                        "Unescaped '#' (use \\#)".to_string(),
                        Some(pos),
                    );
                }
            }
            Token::Special { ch: ch @ (b'_' | b'^'), pos } if in_body(pos) => {
                if !math.active(&environments) {
                    reserved += 1;
                    checker.push(
                        IssueKind::UnescapedCharacter,
                        format!("'{}' outside math mode (use \\{})", ch as char, ch as char),
                        Some(pos),
                    );
                }
            }
            Token::Comment { start, .. } if in_body(start) => {
                if start > 0 && bytes[start - 1].is_ascii_digit() {
                    reserved += 1;
                    checker.push(
                        IssueKind::UnescapedCharacter,
                        "'%' after a number starts a comment; did you mean \\%?".to_string(),
                        Some(start),
                    );
                }
            }
            _ => {}
        }
    }

    if let Some(pos) = math.dollar.or(math.display) {
        reserved += 1;
        checker.push(
            IssueKind::UnescapedCharacter,
            "Unmatched '$' (use \\$ for a dollar sign)".to_string(),
            Some(pos),
        );
    }

    for pos in braces {
        checker.push(
            IssueKind::UnbalancedBraces,
            "Unclosed brace".to_string(),
            Some(pos),
        );
    }
    for (env, at) in environments {
        checker.push(
            IssueKind::UnbalancedEnvironments,
            format!("\\begin{{{env}}} is never closed"),
            Some(at),
        );
    }

    if has_documentclass && body_start.is_none() {
        checker.push(
            IssueKind::MissingDocumentBody,
            "\\documentclass without \\begin{document}".to_string(),
            None,
        );
    }

    let mut empty = 0u32;
    for section in parse_sections(source).iter().filter(|s| !s.is_unnamed()) {
        if is_blank_latex(&source[section.body.clone()]) {
            empty += 1;
            checker.push(
                IssueKind::EmptySection,
                format!("Section '{}' is empty", section.name),
                Some(section.heading.start),
            );
        }
    }

    let mut malformed = 0u32;
    for pos in malformed_headings(source) {
        malformed += 1;
        checker.push(
            IssueKind::MalformedHeading,
            "\\section without a {title} or with an empty one".to_string(),
            Some(pos),
        );
    }

    let mut report = HealthReport {
        is_healthy: false,
        score: 0,
        issues: checker.issues,
    };

    let capped = |count: u32, (each, cap): (u32, u32)| (count * each).min(cap);
    let mut deduction = 0;
    if report.count(IssueKind::UnbalancedBraces) > 0 {
        deduction += BRACE_PENALTY;
    }
    if report.count(IssueKind::UnbalancedEnvironments) > 0 {
        deduction += ENVIRONMENT_PENALTY;
    }
    if report.count(IssueKind::MissingDocumentBody) > 0 {
        deduction += MISSING_BODY_PENALTY;
    }
    deduction += capped(reserved, RESERVED_CHARACTER_PENALTY);
    deduction += capped(empty, EMPTY_SECTION_PENALTY);
    deduction += capped(malformed, MALFORMED_HEADING_PENALTY);

    report.score = 100u32.saturating_sub(deduction);
    report.is_healthy = report.score > HEALTHY_THRESHOLD;
    report
}
