// Prompt constants for the self-healing compiler.

/// Role prompt for repair calls.
pub const REPAIR_SYSTEM: &str = "You are an expert LaTeX debugger. \
    You receive a complete LaTeX document that failed to compile together with \
    the relevant part of the compiler log, and you return the corrected document.";

/// Repair instruction.
/// Replace: {log}, {preservation}
pub const REPAIR_INSTRUCTION_TEMPLATE: &str = r#"The LaTeX document in CONTEXT failed to compile.

COMPILER LOG:
{log}

Fix the document so it compiles.
Rules:
1. Return the COMPLETE document, from \documentclass to \end{document}.
2. Preserve all content, section order and structure. Change only what the error requires.
3. Common causes: unbalanced \begin/\end pairs, unclosed braces, unescaped & % $ # _, undefined commands.

{preservation}

Use the label "repair" and summarise the fix in one line."#;
