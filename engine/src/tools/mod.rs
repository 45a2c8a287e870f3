//! Tools the executor can call from a plan step
//!
//! Plan steps name a tool with a call-like syntax, `tool_name("argument")`.
//! [`ToolName`] recognises the prefix, [`ToolName::parse_call`] pulls the quoted
//! argument out, and [`ToolRegistry::invoke`] runs the resulting [`ToolCall`].

pub mod web_search;

pub use web_search::TavilySearch;

use async_trait::async_trait;
use regex::Regex;
use sdk::errors::EngineError;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::jobs::JobStore;

/// Every tool a plan may reference, in dispatch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    WebSearch,
    LoadJobByTitle,
    SearchJobsByTitle,
    ListAllJobs,
    GetJobByFilename,
    SearchJobsByCriteria,
}

impl ToolName {
    /// Priority order used when matching a step prefix
    pub const ALL: [ToolName; 6] = [
        ToolName::WebSearch,
        ToolName::LoadJobByTitle,
        ToolName::SearchJobsByTitle,
        ToolName::ListAllJobs,
        ToolName::GetJobByFilename,
        ToolName::SearchJobsByCriteria,
    ];

    /// Name as it appears in plan steps
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::WebSearch => "web_search_tool",
            ToolName::LoadJobByTitle => "load_job_by_title",
            ToolName::SearchJobsByTitle => "search_jobs_by_title",
            ToolName::ListAllJobs => "list_all_jobs",
            ToolName::GetJobByFilename => "get_job_by_filename",
            ToolName::SearchJobsByCriteria => "search_jobs_by_criteria",
        }
    }

    /// Result recorded when the step names this tool but its argument can't be
    /// extracted. `None` for tools that take no argument.
    pub fn parse_error(&self) -> Option<&'static str> {
        match self {
            ToolName::WebSearch => Some("Error: Could not parse web search query"),
            ToolName::LoadJobByTitle => Some("Error: Could not parse job title"),
            ToolName::SearchJobsByTitle => Some("Error: Could not parse search term"),
            ToolName::ListAllJobs => None,
            ToolName::GetJobByFilename => Some("Error: Could not parse filename"),
            ToolName::SearchJobsByCriteria => Some("Error: Could not parse search criteria"),
        }
    }

    /// First tool (in priority order) whose name prefixes `step`
    pub fn from_step(step: &str) -> Option<ToolName> {
        Self::ALL
            .into_iter()
            .find(|tool| step.starts_with(tool.as_str()))
    }

    /// Extract this tool's argument from `step`.
    ///
    /// Arguments must be double-quoted; `web_search_tool` also accepts single quotes.
    /// `list_all_jobs` needs no argument and always succeeds.
    pub fn parse_call(&self, step: &str) -> Option<ToolCall> {
        if *self == ToolName::ListAllJobs {
            return Some(ToolCall::ListAllJobs);
        }

        let argument = argument_patterns()
            .iter()
            .filter(|(tool, _)| tool == self)
            .find_map(|(_, re)| re.captures(step))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())?;

        Some(match self {
            ToolName::WebSearch => ToolCall::WebSearch(argument),
            ToolName::LoadJobByTitle => ToolCall::LoadJobByTitle(argument),
            ToolName::SearchJobsByTitle => ToolCall::SearchJobsByTitle(argument),
            ToolName::ListAllJobs => ToolCall::ListAllJobs,
            ToolName::GetJobByFilename => ToolCall::GetJobByFilename(argument),
            ToolName::SearchJobsByCriteria => ToolCall::SearchJobsByCriteria(argument),
        })
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument extraction patterns, tried in order per tool.
static ARGUMENT_PATTERNS: OnceLock<Vec<(ToolName, Regex)>> = OnceLock::new();

fn argument_patterns() -> &'static [(ToolName, Regex)] {
    ARGUMENT_PATTERNS.get_or_init(|| {
        let mut patterns: Vec<(ToolName, Regex)> = ToolName::ALL
            .into_iter()
            .filter(|tool| *tool != ToolName::ListAllJobs)
            .map(|tool| {
                let re = Regex::new(&format!(r#"{}\("(.+?)"\)"#, tool.as_str()))
                    .expect("Invalid tool argument pattern");
                (tool, re)
            })
            .collect();

        patterns.push((
            ToolName::WebSearch,
            Regex::new(r"web_search_tool\('(.+?)'\)").expect("Invalid web search pattern"),
        ));
        patterns
    })
}

/// A fully parsed tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    WebSearch(String),
    LoadJobByTitle(String),
    SearchJobsByTitle(String),
    ListAllJobs,
    GetJobByFilename(String),
    SearchJobsByCriteria(String),
}

impl ToolCall {
    pub fn tool(&self) -> ToolName {
        match self {
            ToolCall::WebSearch(_) => ToolName::WebSearch,
            ToolCall::LoadJobByTitle(_) => ToolName::LoadJobByTitle,
            ToolCall::SearchJobsByTitle(_) => ToolName::SearchJobsByTitle,
            ToolCall::ListAllJobs => ToolName::ListAllJobs,
            ToolCall::GetJobByFilename(_) => ToolName::GetJobByFilename,
            ToolCall::SearchJobsByCriteria(_) => ToolName::SearchJobsByCriteria,
        }
    }

    pub fn argument(&self) -> Option<&str> {
        match self {
            ToolCall::WebSearch(arg)
            | ToolCall::LoadJobByTitle(arg)
            | ToolCall::SearchJobsByTitle(arg)
            | ToolCall::GetJobByFilename(arg)
            | ToolCall::SearchJobsByCriteria(arg) => Some(arg),
            ToolCall::ListAllJobs => None,
        }
    }
}

/// External web search capability
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Run `query` and return the results serialized as text
    async fn search(&self, query: &str) -> Result<String, EngineError>;
}

/// The six tools bound to their backends.
///
/// Every tool is string-in/string-out. "Not found" outcomes are ordinary
/// results; only backend failures are errors.
pub struct ToolRegistry {
    web: Arc<dyn WebSearchProvider>,
    jobs: Arc<JobStore>,
}

impl ToolRegistry {
    pub fn new(web: Arc<dyn WebSearchProvider>, jobs: Arc<JobStore>) -> Self {
        Self { web, jobs }
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Run one tool call
    pub async fn invoke(&self, call: &ToolCall) -> Result<String, EngineError> {
        debug!(tool = %call.tool(), argument = call.argument().unwrap_or(""), "Invoking tool");

        match call {
            ToolCall::WebSearch(query) => self.web.search(query).await,
            ToolCall::LoadJobByTitle(title) => self.jobs.load_by_title(title).await,
            ToolCall::SearchJobsByTitle(term) => self.jobs.search_by_title(term).await,
            ToolCall::ListAllJobs => self.jobs.list_all().await,
            ToolCall::GetJobByFilename(filename) => self.jobs.get_by_filename(filename).await,
            ToolCall::SearchJobsByCriteria(criteria) => self.jobs.search_by_criteria(criteria).await,
        }
    }
}
