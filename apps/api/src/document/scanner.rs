//! Comment- and verbatim-aware token scanner shared by the section parser,
//! the health checker and the ATS text extractor.
//!
//! This is not a LaTeX grammar. It only recognises what the structural
//! passes need: control words, control symbols, comments and the handful of
//! reserved single characters. Everything else is skipped byte by byte, which
//! is safe on UTF-8 input because every byte it matches is ASCII.

use std::ops::Range;

/// Environments whose bodies are opaque: nothing inside them is tokenised.
pub const VERBATIM_ENVIRONMENTS: &[&str] = &[
    "verbatim",
    "verbatim*",
    "Verbatim",
    "lstlisting",
    "minted",
    "comment",
];

/// Inline verbatim commands whose argument is delimited by an arbitrary character.
const INLINE_VERBATIM_COMMANDS: &[&str] = &["verb", "lstinline"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A control word such as `\section`. `end` is the byte after the name.
    Command {
        name: &'a str,
        start: usize,
        end: usize,
    },
    /// A control symbol such as `\%`, `\\` or `\(`. `pos` is the backslash.
    Symbol { ch: u8, pos: usize },
    /// An unescaped `{ } & # _ ^ $` outside comments and verbatim.
    Special { ch: u8, pos: usize },
    /// A `%` comment running to the end of its line (newline excluded).
    Comment { start: usize, end: usize },
}

/// Iterator over the structural tokens of a LaTeX source.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    /// Set after a verbatim `\begin{..}`: once `pos` passes `from`, jump to `to`.
    verbatim_skip: Option<(usize, usize)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            verbatim_skip: None,
        }
    }

    fn schedule_verbatim_skip(&mut self, command_end: usize) {
        let Some((inner, group_end)) = brace_group(self.source, skip_whitespace(self.source, command_end))
        else {
            return;
        };
        let env = &self.source[inner];
        if !VERBATIM_ENVIRONMENTS.contains(&env) {
            return;
        }
        let terminator = format!("\\end{{{env}}}");
        let body_end = self.source[group_end..]
            .find(&terminator)
            .map(|offset| group_end + offset)
            .unwrap_or(self.source.len());
        self.verbatim_skip = Some((group_end, body_end));
    }

    fn skip_inline_verbatim(&mut self, command_end: usize) {
        let bytes = self.source.as_bytes();
        let mut idx = command_end;
        if bytes.get(idx) == Some(&b'*') {
            idx += 1;
        }
        match bytes.get(idx).copied() {
            Some(b'{') => {
                if let Some((_, end)) = brace_group(self.source, idx) {
                    self.pos = end;
                }
            }
            Some(delimiter) if !delimiter.is_ascii_whitespace() && !delimiter.is_ascii_alphabetic() => {
                let stop = line_end(bytes, idx + 1);
                self.pos = bytes[idx + 1..stop]
                    .iter()
                    .position(|&b| b == delimiter)
                    .map(|offset| idx + 1 + offset + 1)
                    .unwrap_or(stop);
            }
            _ => {}
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let bytes = self.source.as_bytes();

        while self.pos < bytes.len() {
            if let Some((from, to)) = self.verbatim_skip {
                if self.pos >= from {
                    self.pos = to.max(self.pos);
                    self.verbatim_skip = None;
                    continue;
                }
            }

            let pos = self.pos;
            match bytes[pos] {
                b'%' => {
                    let end = line_end(bytes, pos);
                    self.pos = end;
                    return Some(Token::Comment { start: pos, end });
                }
                b'\\' => {
                    if let Some((name, end)) = read_command(self.source, pos) {
                        self.pos = end;
                        if name == "begin" {
                            self.schedule_verbatim_skip(end);
                        } else if INLINE_VERBATIM_COMMANDS.contains(&name) {
                            self.skip_inline_verbatim(end);
                        }
                        return Some(Token::Command {
                            name,
                            start: pos,
                            end,
                        });
                    }
                    match bytes.get(pos + 1) {
                        Some(&ch) if ch.is_ascii() => {
                            self.pos = pos + 2;
                            return Some(Token::Symbol { ch, pos });
                        }
                        // Lone trailing backslash or a non-ASCII control symbol.
                        _ => self.pos = pos + 1,
                    }
                }
                ch @ (b'{' | b'}' | b'&' | b'#' | b'_' | b'^' | b'$') => {
                    self.pos = pos + 1;
                    return Some(Token::Special { ch, pos });
                }
                _ => self.pos += 1,
            }
        }

        None
    }
}

/// Reads the control word whose backslash sits at `idx`.
/// Returns the name and the index just past it, or `None` for control symbols.
pub fn read_command(source: &str, idx: usize) -> Option<(&str, usize)> {
    let bytes = source.as_bytes();
    if bytes.get(idx) != Some(&b'\\') {
        return None;
    }
    let start = idx + 1;
    let end = start
        + bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
    (end > start).then(|| (&source[start..end], end))
}

/// Parses a balanced `{...}` group opening at `idx`.
/// Returns the inner range and the index just past the closing brace.
pub fn brace_group(source: &str, idx: usize) -> Option<(Range<usize>, usize)> {
    delimited_group(source, idx, b'{', b'}')
}

/// Parses an optional-argument `[...]` group opening at `idx`.
pub fn bracket_group(source: &str, idx: usize) -> Option<(Range<usize>, usize)> {
    delimited_group(source, idx, b'[', b']')
}

fn delimited_group(source: &str, idx: usize, open: u8, close: u8) -> Option<(Range<usize>, usize)> {
    let bytes = source.as_bytes();
    if bytes.get(idx) != Some(&open) {
        return None;
    }

    let mut depth = 0usize;
    let mut braces = 0usize;
    let mut j = idx;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => {
                j += 2;
                continue;
            }
            b'%' => {
                j = line_end(bytes, j);
                continue;
            }
            b'{' if open != b'{' => braces += 1,
            b'}' if open != b'{' => braces = braces.saturating_sub(1),
            b if b == open => depth += 1,
            b if b == close && braces == 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some((idx + 1..j, j + 1));
                }
            }
            _ => {}
        }
        j += 1;
    }
    None
}

/// Skips ASCII whitespace starting at `idx`.
pub fn skip_whitespace(source: &str, idx: usize) -> usize {
    let bytes = source.as_bytes();
    idx + bytes
        .get(idx..)
        .map(|rest| rest.iter().take_while(|b| b.is_ascii_whitespace()).count())
        .unwrap_or(0)
}

/// Index of the `\n` ending the line that contains `idx`, or the input length.
pub fn line_end(bytes: &[u8], idx: usize) -> usize {
    bytes[idx.min(bytes.len())..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|offset| idx + offset)
        .unwrap_or(bytes.len())
}

/// Reads the environment name following a `\begin` or `\end` command ending at `end`.
pub fn environment_name(source: &str, end: usize) -> Option<(&str, usize)> {
    let (inner, after) = brace_group(source, skip_whitespace(source, end))?;
    Some((source[inner].trim(), after))
}

/// True when `text` contains nothing but whitespace and comments.
pub fn is_blank_latex(text: &str) -> bool {
    text.lines().all(|line| {
        let bytes = line.as_bytes();
        let mut cut = bytes.len();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'%' => {
                    cut = i;
                    break;
                }
                _ => i += 1,
            }
        }
        line.get(..cut).unwrap_or(line).trim().is_empty()
    })
}
