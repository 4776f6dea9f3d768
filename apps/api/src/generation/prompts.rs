// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Role prompt for filling a template from a bio.
pub const GENERATE_SYSTEM: &str = "You are a LaTeX expert and professional résumé writer. \
    You fill LaTeX résumé templates with the facts a person gives you.";

/// Template fill instruction. The template itself travels as CONTEXT.
/// Replace: {bio}, {preservation}
pub const GENERATE_INSTRUCTION_TEMPLATE: &str = r#"Fill the LaTeX template in CONTEXT with data from this bio:

BIO:
{bio}

Rules:
1. Replace every [[PLACEHOLDER]] with content from the bio. Remove lines or entries the bio has no data for; never leave a [[PLACEHOLDER]] behind.
2. Repeat an entry block (role, itemize) for each position the bio mentions.
3. Keep the preamble, custom commands and section order of the template.
4. Return the COMPLETE document, from \documentclass to \end{document}.

{preservation}

Use the label "generate" and summarise what you filled in one line."#;

/// Role prompt for the page squeezer.
pub const SQUEEZE_SYSTEM: &str = "You are a LaTeX layout specialist. \
    You make résumés fit on fewer pages without losing content.";

/// Squeeze instruction. The document travels as CONTEXT.
/// Replace: {preservation}
pub const SQUEEZE_INSTRUCTION_TEMPLATE: &str = r#"Optimise the layout of the LaTeX document in CONTEXT so it fits more content per page.

Rules:
1. Prefer layout changes: margins (not below 0.5in), list spacing, section spacing, font size (not below 10pt).
2. Keep every fact. Tighten wording only where layout changes are not enough.
3. Keep it professional and readable.
4. Return the COMPLETE document, from \documentclass to \end{document}.

{preservation}

Use the label "squeeze" and summarise the layout changes in one line."#;
