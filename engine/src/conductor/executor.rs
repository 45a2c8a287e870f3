//! Conductor Executor
//!
//! Executes the front step of the plan: tool steps go to the [`ToolRegistry`],
//! anything else is answered by the model as a job-analysis expert.

use sdk::errors::EngineError;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::conductor::types::{RunState, Step, StepOutcome};
use crate::llm::{preview, LLMProvider, Message};
use crate::tools::ToolRegistry;

/// Prompt for a step that names no tool
pub fn free_form_prompt(step: &str) -> String {
    format!(
        "You are a recruitment and job analysis expert. Process this step:\n\n\
         Step: {}\n\n\
         Provide expert analysis and recommendations. If this involves job analysis, \
         consider using the available job tools to get specific information.",
        step
    )
}

/// Executes individual plan steps using the tool registry or the model
pub struct Executor {
    llm: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
}

impl Executor {
    pub fn new(llm: Arc<dyn LLMProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self { llm, tools }
    }

    /// Execute the first step of `state.plan`.
    ///
    /// On success exactly one step is removed and one result appended. An
    /// unparseable tool argument is a successful step whose result is the
    /// tool's parse error string. A tool or model failure returns `Err` and
    /// leaves `state` as it was.
    pub async fn execute_step(&self, state: &mut RunState) -> Result<StepOutcome, EngineError> {
        let remaining = state.plan().len();
        info!(
            node = "executor",
            action = "start",
            remaining_steps = remaining,
            "Executor node started"
        );

        let Some(step_text) = state.next_step().map(str::to_string) else {
            warn!(node = "executor", action = "empty_plan", "Executor received empty plan");
            return Ok(StepOutcome::EmptyPlan);
        };

        let step_index = state.intermediate_results().len();
        debug!(node = "executor", step = %step_text, step_index, "Executing next step");

        let (result, degraded) = match self.run(&step_text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    node = "executor",
                    action = "error",
                    step = %step_text,
                    error = %e,
                    "Step execution failed"
                );
                return Err(e);
            }
        };

        info!(
            node = "executor",
            action = "complete",
            step = %step_text,
            response_length = result.len(),
            response_preview = %preview(&result, 100),
            remaining_steps = remaining - 1,
            "Step execution completed"
        );

        state.complete_step(result);
        Ok(StepOutcome::Executed {
            step: step_text,
            degraded,
        })
    }

    /// Produce the result text for one step and whether it is a parse error
    async fn run(&self, step_text: &str) -> Result<(String, bool), EngineError> {
        match Step::parse(step_text) {
            Step::Tool(call) => {
                debug!(tool = %call.tool(), "Dispatching tool step");
                Ok((self.tools.invoke(&call).await?, false))
            }
            Step::Unparseable(tool) => {
                warn!(tool = %tool, step = step_text, "Failed to parse tool argument");
                Ok((tool.parse_error().unwrap_or_default().to_string(), true))
            }
            Step::FreeForm(text) => {
                debug!(step = %text, "Using LLM for general reasoning");
                let reply = self
                    .llm
                    .generate(&[Message::user(free_form_prompt(&text))])
                    .await?;
                Ok((reply, false))
            }
        }
    }
}
