// Log condensation for repair prompts. Engine transcripts run to thousands of
// lines of package chatter; the repair call only needs the error lines and the
// `l.NN` context TeX prints after them.

/// Upper bound on the condensed log handed to the generative service.
const MAX_LOG_CHARS: usize = 4000;
/// Lines kept from the end of a log with no recognisable error line.
const TAIL_LINES: usize = 40;
/// Lines kept after each error line (TeX prints the offending input there).
const CONTEXT_LINES: usize = 2;

fn is_error_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with('!') {
        return true;
    }
    if let Some(rest) = trimmed.strip_prefix("l.") {
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            return true;
        }
    }
    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("error:") || lowered.contains(" error:") || lowered.contains("fatal") {
        return true;
    }
    // `-file-line-error` style: `./resume.tex:12: Undefined control sequence.`
    let mut parts = trimmed.splitn(3, ':');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(file), Some(line_no), Some(_))
            if file.ends_with(".tex") && !line_no.is_empty() && line_no.chars().all(|c| c.is_ascii_digit())
    )
}

/// Reduces an engine log to the lines that explain the failure.
///
/// Error lines are kept with a little trailing context; a log with none falls
/// back to its last lines. The result never exceeds `MAX_LOG_CHARS` characters.
pub fn condense_log(log: &str) -> String {
    let lines: Vec<&str> = log.lines().collect();
    let mut keep = vec![false; lines.len()];

    for (idx, line) in lines.iter().enumerate() {
        if is_error_line(line) {
            let stop = (idx + CONTEXT_LINES + 1).min(lines.len());
            keep[idx..stop].iter_mut().for_each(|k| *k = true);
        }
    }

    let selected: Vec<&str> = if keep.iter().any(|&k| k) {
        lines
            .iter()
            .zip(&keep)
            .filter(|(_, &k)| k)
            .map(|(line, _)| *line)
            .collect()
    } else {
        lines[lines.len().saturating_sub(TAIL_LINES)..].to_vec()
    };

    let joined = selected.join("\n");
    match joined.char_indices().nth(MAX_LOG_CHARS) {
        Some((cut, _)) => format!("{}\n[log truncated]", &joined[..cut]),
        None => joined,
    }
}

/// First error line of a log, for one-line summaries.
pub fn first_error_line(log: &str) -> Option<&str> {
    log.lines().find(|line| is_error_line(line)).map(str::trim)
}
