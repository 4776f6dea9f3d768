//! Lexical keyword extraction for ATS matching.

use std::collections::HashSet;

use crate::document::scanner::{environment_name, Lexer, Token};

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "all", "also", "an", "and", "any", "are", "as", "at",
    "be", "been", "being", "both", "but", "by", "can", "could", "do", "does", "each", "etc", "for",
    "from", "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "may", "me", "more", "most", "must", "my", "no", "not", "of", "on", "or", "other",
    "our", "out", "over", "per", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "to", "under",
    "up", "us", "very", "via", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "within", "would", "you", "your",
    // Job-description filler.
    "ability", "able", "candidate", "candidates", "including", "experience", "ideal", "join",
    "looking", "plus", "preferred", "required", "requirements", "responsibilities", "role",
    "skills", "strong", "team", "using", "work", "working", "years",
];

/// Byte range between `\begin{document}` and `\end{document}`, or the whole input.
fn body_bounds(source: &str) -> (usize, usize) {
    let mut from = 0;
    let mut to = source.len();
    for token in Lexer::new(source) {
        let Token::Command { name, start, end } = token else {
            continue;
        };
        match (name, environment_name(source, end)) {
            ("begin", Some(("document", after))) => from = after,
            ("end", Some(("document", _))) => {
                to = start;
                break;
            }
            _ => {}
        }
    }
    (from, to.max(from))
}

/// Reduces LaTeX to readable text: preamble, comments, command names,
/// environment names and grouping characters are dropped.
pub fn latex_to_plain(source: &str) -> String {
    let (from, to) = body_bounds(source);
    let body = &source[from..to];

    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;

    for token in Lexer::new(body) {
        let (start, end, keep) = match token {
            Token::Command { name, start, end } => {
                let end = if name == "begin" || name == "end" {
                    environment_name(body, end).map_or(end, |(_, after)| after)
                } else {
                    end
                };
                (start, end, None)
            }
            Token::Symbol { ch, pos } => {
                let keep = b"&%$#_{}".contains(&ch).then_some(ch as char);
                (pos, pos + 2, keep)
            }
            Token::Special { pos, .. } => (pos, pos + 1, None),
            Token::Comment { start, end } => (start, end, None),
        };
        if start < cursor {
            continue;
        }
        out.push_str(&body[cursor..start]);
        out.push(keep.unwrap_or(' '));
        cursor = end.min(body.len());
    }
    out.push_str(&body[cursor..]);

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lower-cased keywords in order of first appearance, without duplicates.
/// Tokens such as `c++`, `c#`, `node.js` and `ci/cd` survive intact.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !(c.is_alphanumeric() || "+#./-".contains(c)))
        .map(|raw| raw.trim_matches(|c: char| ".-/".contains(c)).to_lowercase())
        .filter(|token| {
            !token.is_empty()
                && (token.chars().count() >= 2 || token == "c" || token == "r")
                && !token.chars().all(|c| c.is_ascii_digit() || c == '.')
                && !STOP_WORDS.contains(&token.as_str())
        })
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordOverlap {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    /// |jd ∩ resume| / |jd|, or 1.0 when the job description has no keywords.
    pub score: f64,
}

pub fn keyword_overlap(resume_keywords: &[String], jd_keywords: &[String]) -> KeywordOverlap {
    let resume: HashSet<&str> = resume_keywords.iter().map(String::as_str).collect();
    let (matched, missing): (Vec<String>, Vec<String>) = jd_keywords
        .iter()
        .cloned()
        .partition(|keyword| resume.contains(keyword.as_str()));

    let score = if jd_keywords.is_empty() {
        1.0
    } else {
        matched.len() as f64 / jd_keywords.len() as f64
    };

    KeywordOverlap {
        matched,
        missing,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latex_to_plain_drops_markup() {
        let source = "\\documentclass{article}\n\\usepackage{hyperref}\n\\begin{document}\n\\section{Skills}\n\\textbf{Rust} \\& C++ % secret note\n\\begin{itemize}\n\\item 40\\% faster\n\\end{itemize}\n\\end{document}\nafter";
        assert_eq!(latex_to_plain(source), "Skills Rust & C++ 40% faster");
    }

    #[test]
    fn test_latex_to_plain_without_document_env() {
        assert_eq!(latex_to_plain("Plain \\emph{text}"), "Plain text");
    }

    #[test]
    fn test_extract_keywords_keeps_language_tokens() {
        let keywords = extract_keywords("Experience with C++, C#, Node.js and CI/CD. Rust; rust!");
        assert_eq!(keywords, vec!["c++", "c#", "node.js", "ci/cd", "rust"]);
    }

    #[test]
    fn test_extract_keywords_drops_numbers_and_stop_words() {
        let keywords = extract_keywords("5 years of the 2.5 Kubernetes");
        assert_eq!(keywords, vec!["kubernetes"]);
    }

    #[test]
    fn test_keyword_overlap() {
        let resume = extract_keywords("Rust Go Postgres");
        let jd = extract_keywords("Rust Kubernetes Postgres Kafka");
        let overlap = keyword_overlap(&resume, &jd);
        assert_eq!(overlap.matched, vec!["rust", "postgres"]);
        assert_eq!(overlap.missing, vec!["kubernetes", "kafka"]);
        assert!((overlap.score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_jd_scores_full() {
        let overlap = keyword_overlap(&extract_keywords("Rust"), &[]);
        assert_eq!(overlap.score, 1.0);
    }
}
