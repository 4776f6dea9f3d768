use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::compile::repair::{DEFAULT_MAX_REPAIR_ATTEMPTS, MAX_REPAIR_ATTEMPTS_CEILING};
use crate::compile::LatexEngine;
use crate::editing::proposal::{DEFAULT_VARIANT_COUNT, MAX_VARIANT_COUNT};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or any value is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Enables semantic ATS scoring when present.
    pub gemini_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub latex_engine: LatexEngine,
    pub latex_bin: String,
    pub compile_timeout: Duration,
    pub max_repair_attempts: u32,
    pub proposal_variants: usize,
    pub session_ttl: Duration,
    pub session_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let latex_engine: LatexEngine = match get("LATEX_ENGINE") {
            Some(raw) => raw
                .parse()
                .map_err(anyhow::Error::msg)
                .context("LATEX_ENGINE is invalid")?,
            None => LatexEngine::Tectonic,
        };

        let max_repair_attempts: u32 =
            parse_or(&get, "MAX_REPAIR_ATTEMPTS", DEFAULT_MAX_REPAIR_ATTEMPTS)?;
        if max_repair_attempts > MAX_REPAIR_ATTEMPTS_CEILING {
            bail!("MAX_REPAIR_ATTEMPTS must be between 0 and {MAX_REPAIR_ATTEMPTS_CEILING}");
        }

        let proposal_variants: usize = parse_or(&get, "PROPOSAL_VARIANTS", DEFAULT_VARIANT_COUNT)?;
        if !(1..=MAX_VARIANT_COUNT).contains(&proposal_variants) {
            bail!("PROPOSAL_VARIANTS must be between 1 and {MAX_VARIANT_COUNT}");
        }

        let compile_timeout_secs: u64 = parse_or(&get, "COMPILE_TIMEOUT_SECS", 30)?;
        if compile_timeout_secs == 0 {
            bail!("COMPILE_TIMEOUT_SECS must be positive");
        }

        Ok(Config {
            anthropic_api_key: get("ANTHROPIC_API_KEY").with_context(|| {
                "Required environment variable 'ANTHROPIC_API_KEY' is not set".to_string()
            })?,
            gemini_api_key: get("GEMINI_API_KEY"),
            port: parse_or(&get, "PORT", 8000)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            latex_bin: get("LATEX_BIN").unwrap_or_else(|| latex_engine.default_binary().to_string()),
            latex_engine,
            compile_timeout: Duration::from_secs(compile_timeout_secs),
            max_repair_attempts,
            proposal_variants,
            session_ttl: Duration::from_secs(parse_or(&get, "SESSION_TTL_SECS", 1800)?),
            session_capacity: parse_or::<usize>(&get, "SESSION_CAPACITY", 256)?.max(1),
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
