//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the chat models the planner talks to.
//! Two backends are supported: any OpenAI-compatible endpoint (Nebius AI Studio,
//! OpenAI) and a local Ollama server. The conductor only ever sees `dyn LLMProvider`.
//!
//! Two kinds of calls exist:
//! - `generate` returns the raw assistant text (free-form steps, synthesis)
//! - `generate_structured` returns JSON constrained by an [`OutputSchema`]
//!   (the planner's `{"steps": [...]}`, the job extractor)

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::secrets::secret_from_env;

pub mod ollama;
pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    /// The model answered, but not with JSON matching the requested schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Timeout => EngineError::LLMTimeout,
            LLMError::SchemaMismatch(detail) => EngineError::SchemaValidation(detail),
            other => EngineError::LLMProvider(other.to_string()),
        }
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// JSON schema the model's structured answer must follow
#[derive(Debug, Clone)]
pub struct OutputSchema {
    /// Short identifier sent to providers that name their schemas
    pub name: String,

    /// JSON Schema document
    pub schema: Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "nebius", "openai", "ollama")
    fn name(&self) -> &str;

    /// Returns true if this is a local provider (e.g., Ollama), false for cloud providers
    fn is_local(&self) -> bool;

    /// Generate a plain-text reply
    ///
    /// # Arguments
    /// * `messages` - Conversation history, oldest first
    ///
    /// # Returns
    /// * `Ok(String)` - The assistant's text
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, messages: &[Message]) -> Result<String>;

    /// Generate a reply constrained to `schema` and return it as JSON.
    ///
    /// The default appends the schema as an instruction and parses whatever
    /// JSON the model emits. Providers with native structured output override it.
    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &OutputSchema,
    ) -> Result<Value> {
        let mut prompt = messages.to_vec();
        prompt.push(Message::user(schema_instruction(schema)));
        let content = self.generate(&prompt).await?;
        parse_json_output(&content)
    }

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Structured call deserialized straight into `T`.
///
/// A reply that is JSON but does not fit `T` is a [`LLMError::SchemaMismatch`].
pub async fn invoke_structured<T: DeserializeOwned>(
    provider: &dyn LLMProvider,
    messages: &[Message],
    schema: &OutputSchema,
) -> Result<T> {
    let value = provider.generate_structured(messages, schema).await?;
    serde_json::from_value(value)
        .map_err(|e| LLMError::SchemaMismatch(format!("{}: {}", schema.name, e)))
}

/// Build the configured default provider.
///
/// API keys come from the environment variable named in the provider section.
pub fn build_provider(config: &LLMConfig) -> std::result::Result<Arc<dyn LLMProvider>, EngineError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let provider: Arc<dyn LLMProvider> = match config.default_provider.as_str() {
        "nebius" => {
            let key = secret_from_env(&config.nebius.api_key_env)?;
            Arc::new(openai::OpenAIProvider::new(
                "nebius",
                &config.nebius.base_url,
                &config.nebius.model,
                key,
                timeout,
            )?)
        }
        "openai" => {
            let key = secret_from_env(&config.openai.api_key_env)?;
            Arc::new(openai::OpenAIProvider::new(
                "openai",
                &config.openai.base_url,
                &config.openai.model,
                key,
                timeout,
            )?)
        }
        "ollama" => Arc::new(ollama::OllamaProvider::new(
            &config.ollama.base_url,
            &config.ollama.model,
            timeout,
        )?),
        other => {
            return Err(EngineError::Config(format!(
                "Unknown LLM provider '{}'",
                other
            )))
        }
    };

    tracing::info!(
        provider = provider.name(),
        local = provider.is_local(),
        "LLM provider ready"
    );
    Ok(provider)
}

fn schema_instruction(schema: &OutputSchema) -> String {
    format!(
        "Respond only with a JSON object that matches this JSON schema. \
         Do not add any other text.\n{}",
        schema.schema
    )
}

/// Parse a model reply into JSON.
///
/// Handles multiple LLM output formats:
/// 1. Raw JSON
/// 2. Fenced JSON (with or without trailing text): ` ```json\n{...}\n``` `
/// 3. A JSON object embedded in prose
///
/// `<think>...</think>` reasoning blocks (Qwen3 and friends) are dropped first.
pub fn parse_json_output(content: &str) -> Result<Value> {
    let stripped = strip_reasoning(content);
    let trimmed = stripped.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    if let Some(inner) = extract_fenced_json(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(inner.trim()) {
            return Ok(value);
        }
    }

    if let Some(pos) = trimmed.find('{') {
        if let Some(json_str) = extract_balanced_json(&trimmed[pos..]) {
            if let Ok(value) = serde_json::from_str::<Value>(json_str) {
                return Ok(value);
            }
        }
    }

    Err(LLMError::SchemaMismatch(format!(
        "model reply is not JSON: {}",
        preview(trimmed, 120)
    )))
}

/// Remove `<think>...</think>` blocks. An unterminated block drops the rest.
fn strip_reasoning(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract a balanced JSON object starting at position 0 of `s`.
///
/// Counts `{` / `}` depth, respecting string literals, to find the
/// matching close brace.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First `max` characters of `text`, for log lines and error messages
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Map a reqwest send error the way every provider does
pub(crate) fn map_send_error(err: reqwest::Error, base_url: &str) -> LLMError {
    if err.is_timeout() {
        LLMError::Timeout
    } else if err.is_connect() {
        LLMError::ProviderUnavailable(format!("Cannot connect to {}", base_url))
    } else {
        LLMError::NetworkError(err.to_string())
    }
}
