//! Whole-document generation: fill a template from a bio, or squeeze an
//! existing document onto fewer pages. Both results go through the
//! self-healing compiler before they are returned.

use tracing::{info, warn};

use crate::compile::{compile_with_repair, LatexCompiler, RepairOutcome};
use crate::errors::AppError;
use crate::generation::prompts::{
    GENERATE_INSTRUCTION_TEMPLATE, GENERATE_SYSTEM, SQUEEZE_INSTRUCTION_TEMPLATE, SQUEEZE_SYSTEM,
};
use crate::generation::templates::Template;
use crate::llm_client::prompts::LATEX_PRESERVATION_INSTRUCTION;
use crate::llm_client::{fill_template, strip_code_fences, GenerationRequest, TextGenerator};

#[derive(Debug, Clone)]
pub struct GeneratedResume {
    pub summary: String,
    pub repair: RepairOutcome,
}

/// Asks for one complete document and returns its text and summary.
async fn request_document(
    request: GenerationRequest,
    generator: &dyn TextGenerator,
) -> Result<(String, String), AppError> {
    let outputs = generator.generate(&request).await?;
    let output = outputs
        .into_iter()
        .find(|o| !strip_code_fences(&o.text).is_empty())
        .ok_or_else(|| AppError::Llm("the generative service returned no document".to_string()))?;

    let latex = strip_code_fences(&output.text).to_string();
    if !latex.contains("\\documentclass") {
        warn!("Generated document has no \\documentclass; compiling it anyway");
    }
    Ok((latex, output.summary))
}

/// Fills `template` from `bio` and compiles the result with repair.
pub async fn generate_resume(
    bio: &str,
    template: &Template,
    max_repair_attempts: u32,
    generator: &dyn TextGenerator,
    compiler: &dyn LatexCompiler,
) -> Result<GeneratedResume, AppError> {
    let request = GenerationRequest {
        system: GENERATE_SYSTEM,
        instruction: fill_template(
            GENERATE_INSTRUCTION_TEMPLATE,
            &[
                ("bio", bio.trim()),
                ("preservation", LATEX_PRESERVATION_INSTRUCTION),
            ],
        ),
        context: template.latex.to_string(),
        count: 1,
    };

    let (latex, summary) = request_document(request, generator).await?;
    info!("Generated résumé from template '{}' ({} bytes)", template.name, latex.len());

    let repair = compile_with_repair(&latex, max_repair_attempts, compiler, generator).await;
    Ok(GeneratedResume { summary, repair })
}

/// Rewrites `latex` for a denser layout and compiles the result with repair.
pub async fn squeeze_layout(
    latex: &str,
    max_repair_attempts: u32,
    generator: &dyn TextGenerator,
    compiler: &dyn LatexCompiler,
) -> Result<GeneratedResume, AppError> {
    let request = GenerationRequest {
        system: SQUEEZE_SYSTEM,
        instruction: fill_template(
            SQUEEZE_INSTRUCTION_TEMPLATE,
            &[("preservation", LATEX_PRESERVATION_INSTRUCTION)],
        ),
        context: latex.to_string(),
        count: 1,
    };

    let (squeezed, summary) = request_document(request, generator).await?;
    info!("Squeezed layout: {} -> {} bytes", latex.len(), squeezed.len());

    let repair = compile_with_repair(&squeezed, max_repair_attempts, compiler, generator).await;
    Ok(GeneratedResume { summary, repair })
}
