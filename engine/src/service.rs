//! Planning workflows shared by the CLI and the HTTP API
//!
//! [`JobPlanner`] owns one orchestrator, the job store and the extractor, and
//! exposes the three user-facing workflows: plan, save a job, and save a job
//! then plan around it.

use sdk::errors::EngineError;
use sdk::JobRecord;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::conductor::{Orchestrator, RunFailure, RunOutput};
use crate::jobs::{JobExtractor, JobStore};
use crate::llm::{build_provider, LLMProvider};
use crate::tools::{TavilySearch, ToolRegistry, WebSearchProvider};

/// Request used by plan-with-job when the caller supplies none
pub const DEFAULT_JOB_REQUEST: &str =
    "Analyze this job posting and create a preparation plan for applying to it.";

/// A saved job and the run planned around it
#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub filename: String,
    pub job: JobRecord,
    pub run: RunOutput,
}

pub struct JobPlanner {
    orchestrator: Orchestrator,
    jobs: Arc<JobStore>,
    extractor: JobExtractor,
}

impl JobPlanner {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        web: Arc<dyn WebSearchProvider>,
        jobs: Arc<JobStore>,
        extractor: JobExtractor,
    ) -> Self {
        let tools = Arc::new(ToolRegistry::new(web, Arc::clone(&jobs)));
        Self {
            orchestrator: Orchestrator::new(llm, tools),
            jobs,
            extractor,
        }
    }

    /// Wire up the configured model, Tavily and the jobs directory.
    ///
    /// # Errors
    /// `EngineError::Config` when a required API key is missing from the environment.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let llm = build_provider(&config.llm)?;
        let web: Arc<dyn WebSearchProvider> = Arc::new(TavilySearch::from_config(&config.search)?);
        let jobs = Arc::new(JobStore::new(config.core.jobs_dir.clone())?);
        let extractor = JobExtractor::from_kind(config.jobs.extractor, Arc::clone(&llm));

        info!(
            jobs_dir = %config.core.jobs_dir.display(),
            extractor = ?config.jobs.extractor,
            "Job planner ready"
        );
        Ok(Self::new(llm, web, jobs, extractor))
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Run the full loop for `user_input`
    pub async fn plan(&self, user_input: &str) -> Result<RunOutput, RunFailure> {
        self.orchestrator.run(user_input, Vec::new()).await
    }

    /// Parse `job_description` and store it; returns the filename stem and record
    pub async fn save_job(&self, job_description: &str) -> Result<(String, JobRecord), EngineError> {
        let job = self.extractor.extract(job_description).await?;
        let filename = self.jobs.save(&job).await?;
        info!(filename = %filename, title = %job.title, "Job saved");
        Ok((filename, job))
    }

    /// Save the job, then plan with a pointer to the saved file.
    ///
    /// Errors before planning come back as a `RunFailure` in the planning phase
    /// with no results.
    pub async fn plan_with_job(
        &self,
        job_description: &str,
        user_input: Option<&str>,
    ) -> Result<PlannedJob, RunFailure> {
        let (filename, job) = self
            .save_job(job_description)
            .await
            .map_err(|source| RunFailure {
                phase: crate::conductor::Phase::Planning,
                source,
                intermediate_results: Vec::new(),
            })?;

        let request = job_request(user_input, &filename);
        let run = self.plan(&request).await?;
        Ok(PlannedJob { filename, job, run })
    }
}

/// The request planned for a freshly saved job
pub fn job_request(user_input: Option<&str>, filename: &str) -> String {
    let base = user_input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_JOB_REQUEST);
    format!(
        "{}\n\nThe job posting was saved as '{}'. Use get_job_by_filename(\"{}\") to load it.",
        base, filename, filename
    )
}
