//! Re-indents `\begin`/`\end` nesting. Only leading whitespace changes;
//! verbatim bodies are copied through untouched and `document` does not
//! add a level.

use crate::document::scanner::{environment_name, Lexer, Token, VERBATIM_ENVIRONMENTS};

const INDENT: &str = "  ";

#[derive(Debug, Default, PartialEq, Eq)]
struct LineShape {
    opens: usize,
    closes: usize,
    /// The line begins with an `\end`, so it prints one level out.
    leading_end: bool,
    /// A verbatim environment opened and not closed on this line.
    opens_verbatim: Option<String>,
}

fn shape(line: &str) -> LineShape {
    let mut shape = LineShape::default();
    for token in Lexer::new(line) {
        let Token::Command { name, start, end } = token else {
            continue;
        };
        if name != "begin" && name != "end" {
            continue;
        }
        let Some((env, _)) = environment_name(line, end) else {
            continue;
        };
        if env == "document" {
            continue;
        }
        if name == "begin" {
            shape.opens += 1;
            if VERBATIM_ENVIRONMENTS.contains(&env) && !line.contains(&format!("\\end{{{env}}}")) {
                shape.opens_verbatim = Some(env.to_string());
            }
        } else {
            shape.closes += 1;
            if start == 0 {
                shape.leading_end = true;
            }
        }
    }
    shape
}

fn indented(depth: usize, text: &str) -> String {
    format!("{}{}", INDENT.repeat(depth), text)
}

pub fn format_latex(source: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut verbatim: Option<String> = None;

    for line in source.split('\n') {
        let stripped = line.trim();

        if let Some(env) = &verbatim {
            if stripped.starts_with(&format!("\\end{{{env}}}")) {
                depth = depth.saturating_sub(1);
                out.push(indented(depth, stripped));
                verbatim = None;
            } else {
                out.push(line.to_string());
            }
            continue;
        }

        if stripped.is_empty() {
            out.push(String::new());
            continue;
        }

        let shape = shape(stripped);
        let mut closes = shape.closes;
        if shape.leading_end {
            depth = depth.saturating_sub(1);
            closes -= 1;
        }
        out.push(indented(depth, stripped));
        depth = (depth + shape.opens).saturating_sub(closes);
        verbatim = shape.opens_verbatim;
    }

    out.join("\n")
}
