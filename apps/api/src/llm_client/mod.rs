/// LLM client: the single point of entry for all Claude API calls in the service.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Editing, repair and generation go through the `TextGenerator` trait, which
/// `LlmClient` implements. Tests swap in scripted generators.
///
/// Model: claude-sonnet-4-5 (hardcoded, do not make configurable to prevent drift)
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

use prompts::{GENERATION_ENVELOPE_TEMPLATE, JSON_ONLY_SYSTEM};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Full LaTeX documents come back in one response, so the ceiling is generous.
const MAX_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the service could not be reached or refused to serve the request,
    /// as opposed to answering with something unusable.
    pub fn is_unavailable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::RateLimited { .. } => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Parse(_) | LlmError::EmptyContent => false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generative service contract
// ────────────────────────────────────────────────────────────────────────────

/// One request to the generative service: a structured instruction, the text it
/// operates on, and how many independent outputs are wanted.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Role/system prompt owned by the calling module's `prompts.rs`.
    pub system: &'static str,
    pub instruction: String,
    pub context: String,
    pub count: usize,
}

/// One (text, label, summary) triple returned by the generative service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedText {
    #[serde(alias = "latex_code", alias = "latex")]
    pub text: String,
    #[serde(default, alias = "intent")]
    pub label: String,
    #[serde(default, alias = "summary_of_changes")]
    pub summary: String,
}

/// The narrow contract every caller depends on instead of `LlmClient` itself.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedText>, LlmError>;
}

/// Models answer with a bare array, a wrapper object, or a single object
/// when only one output was asked for. All three are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedBatch {
    Many(Vec<GeneratedText>),
    Wrapped {
        #[serde(alias = "proposals", alias = "variants")]
        candidates: Vec<GeneratedText>,
    },
    One(GeneratedText),
}

impl GeneratedBatch {
    fn into_vec(self) -> Vec<GeneratedText> {
        match self {
            GeneratedBatch::Many(texts) => texts,
            GeneratedBatch::Wrapped { candidates } => candidates,
            GeneratedBatch::One(text) => vec![text],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services.
/// Wraps the Anthropic Messages API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        serde_json::from_str(strip_code_fences(text)).map_err(LlmError::Parse)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<GeneratedText>, LlmError> {
        let prompt = build_envelope(request);
        let system = format!("{}\n\n{}", request.system, JSON_ONLY_SYSTEM);

        let batch: GeneratedBatch = self.call_json(&prompt, &system).await?;
        let texts = batch.into_vec();
        if texts.is_empty() {
            return Err(LlmError::EmptyContent);
        }

        debug!(
            "Generative call returned {} output(s) for {} requested",
            texts.len(),
            request.count
        );
        Ok(texts)
    }
}

/// Wraps a request's instruction and context in the shared response-schema envelope.
fn build_envelope(request: &GenerationRequest) -> String {
    fill_template(
        GENERATION_ENVELOPE_TEMPLATE,
        &[
            ("count", request.count.max(1).to_string().as_str()),
            ("instruction", request.instruction.as_str()),
            ("context", request.context.as_str()),
        ],
    )
}

/// Substitutes `{key}` placeholders in one pass. Substituted values are never
/// rescanned, so user text containing `{count}` or `{context}` survives as is.
/// Braces that do not name a key are copied through.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = values.iter().find(|(key, _)| {
            after.starts_with(key) && after[key.len()..].starts_with('}')
        });
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Strips ```json / ```latex / ```tex / bare ``` fences from LLM output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop an info string such as `json` or `latex` on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) if rest[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest,
    };

    rest.trim_end()
        .strip_suffix("```")
        .map(|s| s.trim())
        .unwrap_or(rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_latex_fences_keeps_body_intact() {
        let input = "```latex\n\\section{Skills}\nRust, Go\n```";
        assert_eq!(strip_code_fences(input), "\\section{Skills}\nRust, Go");
    }

    #[test]
    fn test_generated_batch_accepts_array() {
        let json = r#"[{"text": "a", "label": "concise", "summary": "s"}]"#;
        let batch: GeneratedBatch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.into_vec().len(), 1);
    }

    #[test]
    fn test_generated_batch_accepts_wrapped_proposals() {
        let json = r#"{"proposals": [
            {"id": "1", "intent": "Standard", "latex_code": "x", "summary": "a"},
            {"id": "2", "intent": "Concise", "latex_code": "y", "summary": "b"}
        ]}"#;
        let texts = serde_json::from_str::<GeneratedBatch>(json)
            .unwrap()
            .into_vec();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].label, "Standard");
        assert_eq!(texts[1].text, "y");
    }

    #[test]
    fn test_generated_batch_accepts_single_resume_update() {
        let json = r#"{"latex_code": "\\documentclass{article}", "summary_of_changes": "filled", "is_complete_document": true}"#;
        let texts = serde_json::from_str::<GeneratedBatch>(json)
            .unwrap()
            .into_vec();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].summary, "filled");
        assert!(texts[0].label.is_empty());
    }

    #[test]
    fn test_envelope_substitutes_all_placeholders() {
        let request = GenerationRequest {
            system: "sys",
            instruction: "Rewrite it".to_string(),
            context: "BS CS".to_string(),
            count: 3,
        };
        let prompt = build_envelope(&request);
        assert!(prompt.contains("Rewrite it"));
        assert!(prompt.contains("BS CS"));
        assert!(prompt.contains('3'));
        assert!(!prompt.contains("{instruction}"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_fill_template_does_not_rescan_values() {
        let filled = fill_template(
            "USER: {instruction}\nScope: {scope} ({count})\n\\begin{itemize}",
            &[
                ("instruction", "write {count} bullets about {scope}"),
                ("scope", "Experience"),
                ("count", "3"),
            ],
        );
        assert_eq!(
            filled,
            "USER: write {count} bullets about {scope}\nScope: Experience (3)\n\\begin{itemize}"
        );
    }

    #[test]
    fn test_envelope_keeps_placeholders_inside_instruction() {
        let request = GenerationRequest {
            system: "sys",
            instruction: "mention {context} literally".to_string(),
            context: "BODY".to_string(),
            count: 2,
        };
        let prompt = build_envelope(&request);
        assert!(prompt.starts_with("mention {context} literally"));
        assert_eq!(prompt.matches("BODY").count(), 1);
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(LlmError::RateLimited { retries: 3 }.is_unavailable());
        assert!(LlmError::Api {
            status: 503,
            message: String::new()
        }
        .is_unavailable());
        assert!(!LlmError::Api {
            status: 400,
            message: String::new()
        }
        .is_unavailable());
        assert!(!LlmError::EmptyContent.is_unavailable());
    }
}
