//! Self-Healing Compiler: compile, and on failure ask the generative service
//! for a corrected document, up to a fixed number of times.
//!
//! The loop is iterative and bounded. When the budget runs out the caller gets
//! the last source that was tried, the last failing result and
//! `exhausted = true`, never an error.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::compile::diagnostics::{condense_log, first_error_line};
use crate::compile::prompts::{REPAIR_INSTRUCTION_TEMPLATE, REPAIR_SYSTEM};
use crate::compile::{CompileReport, CompileResult, LatexCompiler};
use crate::llm_client::prompts::LATEX_PRESERVATION_INSTRUCTION;
use crate::llm_client::{fill_template, strip_code_fences, GenerationRequest, TextGenerator};

pub const DEFAULT_MAX_REPAIR_ATTEMPTS: u32 = 3;
/// Hard ceiling regardless of configuration or request parameters.
pub const MAX_REPAIR_ATTEMPTS_CEILING: u32 = 5;

#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// The last source that was compiled (the input if no repair was applied).
    pub final_source: String,
    /// Result of compiling `final_source`.
    pub result: CompileResult,
    pub compile_attempts: u32,
    pub repair_attempts: u32,
    /// True when the loop ended without a successful compile.
    pub exhausted: bool,
}

impl RepairOutcome {
    /// Wraps a single compile that was not followed by any repair.
    pub fn single(source: &str, result: CompileResult) -> Self {
        Self {
            final_source: source.to_string(),
            exhausted: !result.ok,
            result,
            compile_attempts: 1,
            repair_attempts: 0,
        }
    }
}

/// JSON shape of a `RepairOutcome`.
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    #[serde(flatten)]
    pub compile: CompileReport,
    pub latex: String,
    pub compile_attempts: u32,
    pub repair_attempts: u32,
    pub exhausted: bool,
}

impl From<&RepairOutcome> for RepairReport {
    fn from(outcome: &RepairOutcome) -> Self {
        Self {
            compile: CompileReport::from(&outcome.result),
            latex: outcome.final_source.clone(),
            compile_attempts: outcome.compile_attempts,
            repair_attempts: outcome.repair_attempts,
            exhausted: outcome.exhausted,
        }
    }
}

fn repair_request(source: &str, log: &str) -> GenerationRequest {
    GenerationRequest {
        system: REPAIR_SYSTEM,
        instruction: fill_template(
            REPAIR_INSTRUCTION_TEMPLATE,
            &[
                ("log", condense_log(log).as_str()),
                ("preservation", LATEX_PRESERVATION_INSTRUCTION),
            ],
        ),
        context: source.to_string(),
        count: 1,
    }
}

/// Compiles `source`, repairing it through `generator` at most `max_attempts`
/// times (clamped to `MAX_REPAIR_ATTEMPTS_CEILING`).
///
/// A repair that comes back byte-identical counts against the budget but is not
/// recompiled. A failed repair call stops the loop; its error is appended to
/// the last log.
pub async fn compile_with_repair(
    source: &str,
    max_attempts: u32,
    compiler: &dyn LatexCompiler,
    generator: &dyn TextGenerator,
) -> RepairOutcome {
    let budget = max_attempts.min(MAX_REPAIR_ATTEMPTS_CEILING);

    let mut current = source.to_string();
    let mut result = compiler.compile(&current).await;
    let mut compile_attempts = 1;
    let mut repair_attempts = 0;

    while !result.ok && repair_attempts < budget {
        repair_attempts += 1;
        info!(
            "Compilation failed ({}), requesting repair {}/{}",
            first_error_line(result.log_text()).unwrap_or("no error line"),
            repair_attempts,
            budget
        );

        let request = repair_request(&current, result.log_text());
        let repaired = match generator.generate(&request).await {
            Ok(texts) => texts
                .into_iter()
                .map(|t| strip_code_fences(&t.text).to_string())
                .find(|text| !text.trim().is_empty()),
            Err(e) => {
                warn!("Repair call {} failed: {}", repair_attempts, e);
                result = CompileResult::failure(format!(
                    "{}\n\nRepair request failed: {e}",
                    result.log_text()
                ));
                break;
            }
        };

        let Some(repaired) = repaired else {
            warn!("Repair call {} returned no source", repair_attempts);
            result = CompileResult::failure(format!(
                "{}\n\nRepair request returned no source",
                result.log_text()
            ));
            break;
        };

        if repaired == current {
            debug!("Repair {} returned identical source, not recompiling", repair_attempts);
            continue;
        }

        current = repaired;
        result = compiler.compile(&current).await;
        compile_attempts += 1;
    }

    let exhausted = !result.ok;
    if exhausted {
        warn!(
            "Compilation still failing after {} repair attempt(s)",
            repair_attempts
        );
    } else if repair_attempts > 0 {
        info!("Compilation succeeded after {} repair attempt(s)", repair_attempts);
    }

    RepairOutcome {
        final_source: current,
        result,
        compile_attempts,
        repair_attempts,
        exhausted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::testing::{generated, ScriptedCompiler, ScriptedGenerator};

    const BROKEN: &str = "\\documentclass{article}\n\\begin{document}\n\\section{Skills}\n\\begin{itemize}\n\\item Rust\n\\end{document}\n";
    const FIXED: &str = "\\documentclass{article}\n\\begin{document}\n\\section{Skills}\n\\begin{itemize}\n\\item Rust\n\\end{itemize}\n\\end{document}\n";

    #[tokio::test]
    async fn test_clean_source_compiles_once_without_repair() {
        let compiler = ScriptedCompiler::default();
        let generator = ScriptedGenerator::default();

        let outcome = compile_with_repair(FIXED, 3, &compiler, &generator).await;

        assert!(outcome.result.ok);
        assert!(!outcome.exhausted);
        assert_eq!(outcome.compile_attempts, 1);
        assert_eq!(outcome.repair_attempts, 0);
        assert_eq!(generator.calls(), 0);
        assert_eq!(outcome.final_source, FIXED);
    }

    #[tokio::test]
    async fn test_unbalanced_itemize_is_repaired() {
        let compiler = ScriptedCompiler::default();
        let generator = ScriptedGenerator::repeating(vec![generated("repair", "closed itemize", FIXED)]);

        let outcome = compile_with_repair(BROKEN, 3, &compiler, &generator).await;

        assert!(outcome.result.ok);
        assert!(outcome.result.pdf.is_some());
        assert_eq!(outcome.final_source, FIXED);
        assert_eq!(outcome.repair_attempts, 1);
        assert_eq!(outcome.compile_attempts, 2);
        assert!(generator.calls() <= 3);
    }

    #[tokio::test]
    async fn test_repair_prompt_carries_source_and_condensed_log() {
        let compiler = ScriptedCompiler::default();
        let generator = ScriptedGenerator::repeating(vec![generated("repair", "", FIXED)]);

        compile_with_repair(BROKEN, 3, &compiler, &generator).await;

        let request = &generator.requests()[0];
        assert_eq!(request.context, BROKEN);
        assert!(request.instruction.contains("! LaTeX Error"));
        assert_eq!(request.count, 1);
    }

    #[tokio::test]
    async fn test_identical_repairs_terminate_after_budget() {
        let compiler = ScriptedCompiler::default();
        let generator = ScriptedGenerator::repeating(vec![generated("repair", "no-op", BROKEN)]);

        let outcome = compile_with_repair(BROKEN, 3, &compiler, &generator).await;

        assert!(outcome.exhausted);
        assert!(!outcome.result.ok);
        assert!(outcome.result.log.is_some());
        assert_eq!(generator.calls(), 3);
        assert_eq!(outcome.repair_attempts, 3);
        // Identical repairs are never recompiled.
        assert_eq!(compiler.calls(), 1);
        assert_eq!(outcome.final_source, BROKEN);
    }

    #[tokio::test]
    async fn test_still_broken_repairs_return_last_attempted_source() {
        let compiler = ScriptedCompiler::default();
        let attempts: Vec<_> = (1..=3)
            .map(|i| Ok(vec![generated("repair", "", &format!("{BROKEN}% attempt {i}\n"))]))
            .collect();
        let generator = ScriptedGenerator::new(attempts);

        let outcome = compile_with_repair(BROKEN, 3, &compiler, &generator).await;

        assert!(outcome.exhausted);
        assert_eq!(outcome.compile_attempts, 4);
        assert!(outcome.final_source.ends_with("% attempt 3\n"));
    }

    #[tokio::test]
    async fn test_budget_is_clamped_to_ceiling() {
        let compiler = ScriptedCompiler::default();
        let generator = ScriptedGenerator::repeating(vec![generated("repair", "", BROKEN)]);

        let outcome = compile_with_repair(BROKEN, 50, &compiler, &generator).await;

        assert_eq!(generator.calls(), MAX_REPAIR_ATTEMPTS_CEILING as usize);
        assert!(outcome.exhausted);
    }

    #[tokio::test]
    async fn test_zero_budget_never_calls_generator() {
        let compiler = ScriptedCompiler::default();
        let generator = ScriptedGenerator::default();

        let outcome = compile_with_repair(BROKEN, 0, &compiler, &generator).await;

        assert!(outcome.exhausted);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_repair_call_ends_loop_with_log() {
        let compiler = ScriptedCompiler::default();
        let generator = ScriptedGenerator::new(vec![Err(LlmError::EmptyContent)]);

        let outcome = compile_with_repair(BROKEN, 3, &compiler, &generator).await;

        assert!(outcome.exhausted);
        assert_eq!(generator.calls(), 1);
        assert_eq!(outcome.final_source, BROKEN);
        assert!(outcome.result.log_text().contains("Repair request failed"));
    }

    #[tokio::test]
    async fn test_fenced_repair_output_is_unwrapped() {
        let compiler = ScriptedCompiler::default();
        let fenced = format!("```latex\n{FIXED}```");
        let generator = ScriptedGenerator::repeating(vec![generated("repair", "", &fenced)]);

        let outcome = compile_with_repair(BROKEN, 3, &compiler, &generator).await;

        assert!(outcome.result.ok);
        assert_eq!(outcome.final_source.trim(), FIXED.trim());
    }

    #[test]
    fn test_report_flattens_compile_fields() {
        let outcome = RepairOutcome::single("x", CompileResult::failure("! boom"));
        let json = serde_json::to_value(RepairReport::from(&outcome)).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["log"], "! boom");
        assert_eq!(json["latex"], "x");
        assert_eq!(json["exhausted"], true);
    }
}
