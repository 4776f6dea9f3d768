// Shared prompt constants for the generative client.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains the cross-cutting fragments and the response envelope.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction shared by every prompt that returns LaTeX.
pub const LATEX_PRESERVATION_INSTRUCTION: &str = "\
    CRITICAL: Return LaTeX that compiles. Escape reserved characters in prose \
    (\\&, \\%, \\$, \\#, \\_). Keep every \\begin{...} paired with its \\end{...}. \
    Do NOT invent employers, dates, degrees or metrics that are not in the input.";

/// Envelope wrapped around every generative request.
/// Replace: {instruction}, {count}, {context}
pub const GENERATION_ENVELOPE_TEMPLATE: &str = r#"{instruction}

Return a JSON ARRAY of exactly {count} object(s) with this EXACT schema:
[
  {
    "label": "short intent label, e.g. concise",
    "summary": "one line describing the change",
    "text": "the literal LaTeX"
  }
]

CONTEXT:
{context}"#;
