// Compilation: the external LaTeX engine behind a narrow trait, plus the
// bounded self-healing loop that drives it together with the generative client.
// All retry policy lives in `repair`; the gateway itself never retries.

pub mod diagnostics;
pub mod gateway;
pub mod handlers;
pub mod prompts;
pub mod repair;

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::Serialize;

pub use gateway::{LatexEngine, ProcessCompiler};
pub use repair::{compile_with_repair, RepairOutcome};

/// Outcome of one compiler invocation.
///
/// Invariant: `pdf` is present iff `ok`, `log` is present iff `!ok`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    pub ok: bool,
    pub pdf: Option<Bytes>,
    pub log: Option<String>,
}

impl CompileResult {
    pub fn success(pdf: Bytes) -> Self {
        Self {
            ok: true,
            pdf: Some(pdf),
            log: None,
        }
    }

    pub fn failure(log: impl Into<String>) -> Self {
        Self {
            ok: false,
            pdf: None,
            log: Some(log.into()),
        }
    }

    /// Diagnostic log, or an empty string for successful results.
    pub fn log_text(&self) -> &str {
        self.log.as_deref().unwrap_or("")
    }
}

/// Source text in, structured result out. Implementations must not panic or
/// return errors: every failure mode is an `ok = false` result with a log.
#[async_trait]
pub trait LatexCompiler: Send + Sync {
    async fn compile(&self, source: &str) -> CompileResult;
}

/// JSON shape of a `CompileResult`; the PDF travels as standard base64.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl From<&CompileResult> for CompileReport {
    fn from(result: &CompileResult) -> Self {
        Self {
            ok: result.ok,
            pdf_base64: result
                .pdf
                .as_ref()
                .map(|pdf| base64::engine::general_purpose::STANDARD.encode(pdf)),
            log: result.log.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_pdf_and_no_log() {
        let result = CompileResult::success(Bytes::from_static(b"%PDF"));
        assert!(result.ok);
        assert!(result.pdf.is_some());
        assert!(result.log.is_none());
        assert_eq!(result.log_text(), "");
    }

    #[test]
    fn test_failure_has_log_and_no_pdf() {
        let result = CompileResult::failure("! Undefined control sequence.");
        assert!(!result.ok);
        assert!(result.pdf.is_none());
        assert_eq!(result.log_text(), "! Undefined control sequence.");
    }

    #[test]
    fn test_report_encodes_pdf_as_base64() {
        let report = CompileReport::from(&CompileResult::success(Bytes::from_static(b"%PDF")));
        assert_eq!(report.pdf_base64.as_deref(), Some("JVBERg=="));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("log").is_none());
    }
}
