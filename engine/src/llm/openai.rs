//! OpenAI-compatible chat completions provider
//!
//! Serves both Nebius AI Studio and OpenAI; they differ only in base URL,
//! model and key. Structured calls use `response_format: json_schema`.

use super::{map_send_error, parse_json_output, LLMError, LLMProvider, Message, OutputSchema};
use crate::secrets::{scrub, SecretString};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAIProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> super::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::Unknown(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client,
        })
    }

    fn payload(&self, messages: &[Message]) -> Value {
        let api_messages: Vec<Value> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        json!({
            "model": self.model,
            "messages": api_messages,
        })
    }

    /// POST to /chat/completions and return the first choice's content
    async fn complete(&self, payload: &Value) -> super::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.unsecure()))
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| map_send_error(e, &self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub(&response.text().await.unwrap_or_default());

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                500..=599 => LLMError::ProviderUnavailable(format!(
                    "{} API error ({}): {}",
                    self.name, status, text
                )),
                _ => LLMError::InvalidRequest(text),
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        tracing::debug!(
            provider = %self.name,
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chat completion received"
        );

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn generate(&self, messages: &[Message]) -> super::Result<String> {
        let payload = self.payload(messages);
        self.complete(&payload).await
    }

    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &OutputSchema,
    ) -> super::Result<Value> {
        let mut payload = self.payload(messages);
        payload["response_format"] = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
            }
        });

        let content = self.complete(&payload).await?;
        parse_json_output(&content)
    }
}
