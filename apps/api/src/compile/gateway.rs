//! Compile gateway: runs an external LaTeX engine in a throwaway directory.
//!
//! Process failure, timeout, a missing binary and a missing output PDF are all
//! reported as `CompileResult { ok: false, log }`. The temporary directory is
//! removed when the call returns, and the child is killed if the call is
//! abandoned mid-flight.

use std::fmt;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::compile::{CompileResult, LatexCompiler};

const TEX_FILE: &str = "resume.tex";
const PDF_FILE: &str = "resume.pdf";

/// Supported external engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatexEngine {
    Tectonic,
    Pdflatex,
}

impl LatexEngine {
    /// Binary name used when no explicit path is configured.
    pub fn default_binary(&self) -> &'static str {
        match self {
            LatexEngine::Tectonic => "tectonic",
            LatexEngine::Pdflatex => "pdflatex",
        }
    }

    fn args(&self) -> &'static [&'static str] {
        match self {
            LatexEngine::Tectonic => &["--noninteractive", "--chatter", "minimal", TEX_FILE],
            LatexEngine::Pdflatex => &[
                "-interaction=nonstopmode",
                "-halt-on-error",
                "-file-line-error",
                TEX_FILE,
            ],
        }
    }
}

impl fmt::Display for LatexEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_binary())
    }
}

impl FromStr for LatexEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tectonic" => Ok(LatexEngine::Tectonic),
            "pdflatex" => Ok(LatexEngine::Pdflatex),
            other => Err(format!(
                "unsupported LaTeX engine '{other}' (expected 'tectonic' or 'pdflatex')"
            )),
        }
    }
}

/// `LatexCompiler` backed by a child process.
#[derive(Debug, Clone)]
pub struct ProcessCompiler {
    engine: LatexEngine,
    binary: String,
    timeout: Duration,
}

impl ProcessCompiler {
    pub fn new(engine: LatexEngine, binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            engine,
            binary: binary.into(),
            timeout,
        }
    }

    /// Runs the engine once. `Err` carries the diagnostic log.
    async fn run(&self, source: &str) -> Result<Bytes, String> {
        let dir = tempfile::tempdir().map_err(|e| format!("Failed to create build directory: {e}"))?;
        tokio::fs::write(dir.path().join(TEX_FILE), source)
            .await
            .map_err(|e| format!("Failed to write {TEX_FILE}: {e}"))?;

        let mut command = Command::new(&self.binary);
        command
            .args(self.engine.args())
            .current_dir(dir.path())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => {
                return Err(format!(
                    "{} timed out after {}s",
                    self.engine,
                    self.timeout.as_secs()
                ))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(format!(
                    "LaTeX engine '{}' was not found on this host: {e}",
                    self.binary
                ))
            }
            Ok(Err(e)) => return Err(format!("Failed to launch '{}': {e}", self.binary)),
            Ok(Ok(output)) => output,
        };

        let transcript = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if !output.status.success() {
            return Err(format!(
                "{} exited with {}\n{}",
                self.engine,
                output.status,
                transcript.trim()
            ));
        }

        match tokio::fs::read(dir.path().join(PDF_FILE)).await {
            Ok(pdf) => Ok(Bytes::from(pdf)),
            Err(_) => Err(format!(
                "{} reported success but produced no PDF\n{}",
                self.engine,
                transcript.trim()
            )),
        }
    }
}

#[async_trait]
impl LatexCompiler for ProcessCompiler {
    async fn compile(&self, source: &str) -> CompileResult {
        match self.run(source).await {
            Ok(pdf) => {
                debug!("{} produced {} byte PDF", self.engine, pdf.len());
                CompileResult::success(pdf)
            }
            Err(log) => {
                warn!(
                    "{} compilation failed: {}",
                    self.engine,
                    log.lines().next().unwrap_or_default()
                );
                CompileResult::failure(log)
            }
        }
    }
}
