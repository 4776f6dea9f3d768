// Prompt constants for the Edit Proposal Engine.

/// Role prompt for proposal calls.
pub const PROPOSAL_SYSTEM: &str = "You are an expert résumé editor working directly in LaTeX. \
    You rewrite exactly the fragment you are given and nothing else.";

/// Proposal instruction.
/// Replace: {instruction}, {scope}, {count}, {preservation}
pub const PROPOSAL_INSTRUCTION_TEMPLATE: &str = r#"USER INSTRUCTION: {instruction}

The CONTEXT below is {scope} of a LaTeX résumé.
Produce {count} independent rewrites of it that carry out the instruction.

Rules:
1. Rewrite ONLY the given fragment. Do not add \documentclass, a preamble, \begin{document} or \end{document} unless they are already in the fragment.
2. Do NOT repeat the section heading: the fragment starts after it.
3. Keep the custom commands and environments the fragment already uses.
4. Make the rewrites meaningfully different, e.g. a faithful standard edit, an impact-focused edit and a concise edit.
5. "label" is a one or two word intent ("Standard", "Impact", "Concise"); "summary" says what changed in one line.

{preservation}"#;
