//! Conductor Planner
//!
//! Turns the user's request into an ordered list of step strings with a
//! single structured model call.

use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::llm::{invoke_structured, LLMProvider, Message, OutputSchema};

/// Instructions prepended to the task on a fresh conversation
pub const PLANNER_SYSTEM: &str = "You are a planning agent with access to job data. \
Break down the task into steps. Available tools: \
- 'web_search_tool(\"query\")' for external information \
- 'load_job_by_title(\"job_title\")' to load a job by its title \
- 'search_jobs_by_title(\"partial_title\")' to search for jobs by partial title \
- 'list_all_jobs()' to see all available jobs \
- 'get_job_by_filename(\"filename\")' to load job by exact filename \
- 'search_jobs_by_criteria(\"criteria\")' to find relevant jobs \
When you have enough information to plan, output ONLY JSON: {\"steps\": [\"...\"]} \
with 4-7 concrete steps.";

/// Plan sizes the prompt asks for; anything else is only logged
const EXPECTED_STEPS: std::ops::RangeInclusive<usize> = 4..=7;

/// Structured planner output
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub steps: Vec<String>,
}

pub fn plan_schema() -> OutputSchema {
    OutputSchema::new(
        "plan",
        json!({
            "type": "object",
            "description": "A structured plan for a multi-step task",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "A list of tool calls that, when executed, will answer the query."
                }
            },
            "required": ["steps"]
        }),
    )
}

pub struct Planner {
    llm: Arc<dyn LLMProvider>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// The conversation sent to the model.
    ///
    /// An empty history is seeded with the planner instructions and the task;
    /// a non-empty one is sent unchanged.
    pub fn seed_messages(user_input: &str, history: &[Message]) -> Vec<Message> {
        if history.is_empty() {
            vec![Message::user(format!(
                "{}\n\nTask: {}",
                PLANNER_SYSTEM, user_input
            ))]
        } else {
            history.to_vec()
        }
    }

    /// Produce the plan. A reply that doesn't fit `{steps: [string]}` is a
    /// `SchemaValidation` error; there is no retry.
    pub async fn plan(
        &self,
        user_input: &str,
        history: &[Message],
    ) -> Result<Vec<String>, EngineError> {
        info!(
            node = "planner",
            action = "start",
            user_input_length = user_input.len(),
            "Planner node started"
        );

        let messages = Self::seed_messages(user_input, history);
        debug!(message_count = messages.len(), "Invoking planner LLM");

        let plan: Plan = invoke_structured(self.llm.as_ref(), &messages, &plan_schema())
            .await
            .map_err(|e| {
                let err = EngineError::from(e);
                error!(node = "planner", action = "error", error = %err, "Planner node failed");
                err
            })?;

        if !EXPECTED_STEPS.contains(&plan.steps.len()) {
            warn!(
                node = "planner",
                plan_step_count = plan.steps.len(),
                "Plan size outside the requested 4-7 steps"
            );
        }

        info!(
            node = "planner",
            action = "complete",
            plan_step_count = plan.steps.len(),
            plan_steps = ?plan.steps,
            "Planner generated plan successfully"
        );

        Ok(plan.steps)
    }
}
