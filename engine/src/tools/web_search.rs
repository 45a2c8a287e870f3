//! Tavily web search
//!
//! POSTs to `{base_url}/search` and serializes the results as numbered text
//! blocks (title, URL, snippet) for the synthesizer to read.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::WebSearchProvider;
use crate::config::SearchConfig;
use crate::secrets::{scrub, secret_from_env, SecretString};

const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Longest snippet kept per result
const MAX_SNIPPET_CHARS: usize = 500;

/// Tavily API request body.
#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
}

/// Tavily API response.
#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

/// A single result from Tavily.
#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

pub struct TavilySearch {
    base_url: String,
    api_key: SecretString,
    max_results: u32,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        max_results: u32,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| EngineError::WebSearch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_results,
            client,
        })
    }

    /// Build from the `[search]` section, reading the key from the environment
    pub fn from_config(config: &SearchConfig) -> Result<Self, EngineError> {
        let api_key = secret_from_env(&config.api_key_env)?;
        Self::new(&config.base_url, api_key, config.max_results)
    }
}

#[async_trait]
impl WebSearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str) -> Result<String, EngineError> {
        let request = TavilySearchRequest {
            api_key: self.api_key.unsecure(),
            query,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::WebSearch(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = scrub(&response.text().await.unwrap_or_default());
            return Err(EngineError::WebSearch(format!(
                "Tavily API error ({}): {}",
                status, error_text
            )));
        }

        let tavily_response: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| EngineError::WebSearch(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(
            query,
            results = tavily_response.results.len(),
            "Tavily search complete"
        );

        Ok(format_results(query, &tavily_response.results))
    }
}

fn format_results(query: &str, results: &[TavilyResult]) -> String {
    if results.is_empty() {
        return format!("No web results found for '{}'", query);
    }

    let blocks: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{}. {}\n   {}\n   {}",
                i + 1,
                if r.title.is_empty() {
                    "(no title)"
                } else {
                    r.title.as_str()
                },
                r.url,
                truncate(r.content.trim(), MAX_SNIPPET_CHARS)
            )
        })
        .collect();

    format!("Web results for '{}':\n{}", query, blocks.join("\n"))
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
