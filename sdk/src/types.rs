//! Job record and HTTP wire types shared by the engine and the API server

use serde::{Deserialize, Serialize};

/// Structured representation of one job listing.
///
/// Stored as pretty-printed JSON in the jobs directory. Every field defaults
/// to empty so partially filled files written by hand still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub company: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    #[serde(default)]
    pub responsibilities: Vec<String>,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub salary: String,

    /// Employment type (full-time, contract, ...)
    #[serde(default, rename = "type")]
    pub job_type: String,

    #[serde(default)]
    pub posted_date: String,

    #[serde(default)]
    pub benefits: Vec<String>,

    /// SHA-256 of the raw text the record was parsed from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_text_hash: String,
}

impl JobRecord {
    /// Create a record with just a title and company
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    /// Fields searched by keyword criteria, lowercased and space-joined
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.title,
            self.description,
            self.location,
            self.requirements.join(" "),
            self.responsibilities.join(" ")
        )
        .to_lowercase()
    }
}

/// `POST /plan` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub user_input: String,
}

/// `POST /plan` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub final_output: Option<String>,
    pub intermediate_messages: Vec<String>,
}

/// `POST /save-job` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveJobRequest {
    pub job_description: String,
}

/// `POST /save-job` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveJobResponse {
    pub success: bool,
    pub filename: String,
    pub job_data: JobRecord,
}

/// `POST /plan-with-job` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWithJobRequest {
    pub job_description: String,
    #[serde(default)]
    pub user_input: Option<String>,
}

/// `POST /plan-with-job` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanWithJobResponse {
    pub success: bool,
    pub filename: String,
    pub job_data: JobRecord,
    pub final_output: Option<String>,
    pub intermediate_messages: Vec<String>,
}

/// `GET /health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Error body returned for any non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub hint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_serializes_as_type() {
        let mut job = JobRecord::new("Data Scientist", "Acme");
        job.job_type = "Full-time".to_string();

        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["type"], "Full-time");
        assert!(json.get("job_type").is_none());
        // Empty hash is omitted
        assert!(json.get("raw_text_hash").is_none());
    }

    #[test]
    fn test_partial_record_loads_with_defaults() {
        let job: JobRecord = serde_json::from_str(r#"{"title": "Engineer"}"#).unwrap();
        assert_eq!(job.title, "Engineer");
        assert!(job.company.is_empty());
        assert!(job.requirements.is_empty());
    }

    #[test]
    fn test_searchable_text_is_lowercase() {
        let mut job = JobRecord::new("Senior Rust Engineer", "Acme");
        job.location = "Berlin".to_string();
        job.requirements = vec!["Tokio".to_string()];

        let text = job.searchable_text();
        assert!(text.contains("senior rust engineer"));
        assert!(text.contains("berlin"));
        assert!(text.contains("tokio"));
        // Company is not part of the searchable fields
        assert!(!text.contains("acme"));
    }

    #[test]
    fn test_plan_with_job_request_optional_input() {
        let req: PlanWithJobRequest =
            serde_json::from_str(r#"{"job_description": "Engineer at Acme"}"#).unwrap();
        assert!(req.user_input.is_none());
    }
}
