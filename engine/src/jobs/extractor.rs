//! Turns pasted job text into a [`JobRecord`], heuristically or with the model

use sdk::errors::EngineError;
use sdk::JobRecord;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

use super::parsing::parse_job_text;
use crate::config::ExtractorKind;
use crate::llm::{invoke_structured, LLMProvider, Message, OutputSchema};

const EXTRACTION_PROMPT: &str = "Extract the job posting below into a structured record. \
Use empty strings or empty lists for anything the posting does not state. \
Do not invent details.";

pub enum JobExtractor {
    Heuristic,
    Llm(Arc<dyn LLMProvider>),
}

impl JobExtractor {
    pub fn from_kind(kind: ExtractorKind, llm: Arc<dyn LLMProvider>) -> Self {
        match kind {
            ExtractorKind::Heuristic => JobExtractor::Heuristic,
            ExtractorKind::Llm => JobExtractor::Llm(llm),
        }
    }

    pub async fn extract(&self, raw_text: &str) -> Result<JobRecord, EngineError> {
        if raw_text.trim().is_empty() {
            return Err(EngineError::InvalidRequest(
                "job_description must not be empty".to_string(),
            ));
        }

        match self {
            JobExtractor::Heuristic => Ok(parse_job_text(raw_text)),
            JobExtractor::Llm(llm) => {
                let messages = [
                    Message::system(EXTRACTION_PROMPT),
                    Message::user(raw_text),
                ];
                let mut job: JobRecord =
                    invoke_structured(llm.as_ref(), &messages, &job_record_schema()).await?;
                job.raw_text_hash = hex::encode(Sha256::digest(raw_text.as_bytes()));

                info!(
                    provider = llm.name(),
                    title = %job.title,
                    company = %job.company,
                    "Extracted job with LLM"
                );
                Ok(job)
            }
        }
    }
}

/// JSON schema of a job record as the model should emit it
pub fn job_record_schema() -> OutputSchema {
    let string_list = json!({"type": "array", "items": {"type": "string"}});
    OutputSchema::new(
        "job_record",
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "company": {"type": "string"},
                "description": {"type": "string"},
                "requirements": string_list,
                "responsibilities": string_list,
                "location": {"type": "string"},
                "salary": {"type": "string"},
                "type": {"type": "string", "description": "Employment type, e.g. Full-time"},
                "posted_date": {"type": "string"},
                "benefits": string_list,
            },
            "required": ["title", "company", "description", "requirements", "responsibilities"]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMError, Result as LLMResult};
    use async_trait::async_trait;

    struct JsonProvider(String);

    #[async_trait]
    impl LLMProvider for JsonProvider {
        fn name(&self) -> &str {
            "json"
        }

        fn is_local(&self) -> bool {
            true
        }

        async fn generate(&self, _messages: &[Message]) -> LLMResult<String> {
            Ok(self.0.clone())
        }
    }

    struct DownProvider;

    #[async_trait]
    impl LLMProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        fn is_local(&self) -> bool {
            false
        }

        async fn generate(&self, _messages: &[Message]) -> LLMResult<String> {
            Err(LLMError::ProviderUnavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn test_heuristic_extraction() {
        let job = JobExtractor::Heuristic
            .extract("Data Engineer at Initech\nLocation: Austin")
            .await
            .unwrap();
        assert_eq!(job.title, "Data Engineer");
        assert_eq!(job.location, "Austin");
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let err = JobExtractor::Heuristic.extract("  \n ").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_llm_extraction_sets_hash() {
        let reply = r#"{"title": "ML Engineer", "company": "Hooli", "description": "Models",
            "requirements": ["PyTorch"], "responsibilities": [], "type": "Contract"}"#;
        let extractor = JobExtractor::Llm(Arc::new(JsonProvider(reply.to_string())));

        let job = extractor.extract("ML Engineer, Hooli").await.unwrap();
        assert_eq!(job.title, "ML Engineer");
        assert_eq!(job.job_type, "Contract");
        assert_eq!(job.requirements, vec!["PyTorch".to_string()]);
        assert_eq!(job.raw_text_hash.len(), 64);
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let extractor = JobExtractor::Llm(Arc::new(DownProvider));
        let err = extractor.extract("Some job").await.unwrap_err();
        assert!(matches!(err, EngineError::LLMProvider(_)));
    }
}
