//! Conductor Types
//!
//! Run state threaded through the planner, executor, router and synthesizer,
//! plus the parsed form of a single plan step.

use std::collections::VecDeque;
use std::fmt;

use crate::llm::Message;
use crate::tools::{ToolCall, ToolName};

/// One plan element, parsed once before dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A recognised tool with its extracted argument
    Tool(ToolCall),

    /// Anything that doesn't start with a tool name; answered by the model
    FreeForm(String),

    /// Starts with a tool name but the quoted argument could not be extracted
    Unparseable(ToolName),
}

impl Step {
    pub fn parse(text: &str) -> Step {
        match ToolName::from_step(text) {
            Some(tool) => match tool.parse_call(text) {
                Some(call) => Step::Tool(call),
                None => Step::Unparseable(tool),
            },
            None => Step::FreeForm(text.to_string()),
        }
    }
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Executing,
    Synthesizing,
    Done,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Planning => "planning",
            Phase::Executing => "executing",
            Phase::Synthesizing => "synthesizing",
            Phase::Done => "done",
            Phase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Router verdict after an executor step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    ContinueExecuting,
    Synthesize,
}

/// What one executor invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The front step was consumed and one result appended.
    /// `degraded` is set when the result is a parse error string.
    Executed { step: String, degraded: bool },

    /// Nothing left to execute; state untouched
    EmptyPlan,
}

/// State of one planning run.
///
/// Owned by a single run. `plan` only shrinks from the front and
/// `intermediate_results` only grows, one entry per executed step, so
/// `intermediate_results.len()` always equals the number of executed steps.
#[derive(Debug, Clone)]
pub struct RunState {
    user_input: String,
    messages: Vec<Message>,
    planned: Vec<String>,
    plan: VecDeque<String>,
    intermediate_results: Vec<String>,
    final_output: Option<String>,
    phase: Phase,
}

impl RunState {
    /// Fresh run with an empty conversation history
    pub fn new(user_input: impl Into<String>) -> Self {
        Self::with_history(user_input, Vec::new())
    }

    /// Run whose planner continues an existing conversation
    pub fn with_history(user_input: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            user_input: user_input.into(),
            messages,
            planned: Vec::new(),
            plan: VecDeque::new(),
            intermediate_results: Vec::new(),
            final_output: None,
            phase: Phase::Planning,
        }
    }

    /// Run that skips planning and starts executing `steps`
    pub fn with_plan(user_input: impl Into<String>, steps: Vec<String>) -> Self {
        let mut state = Self::new(user_input);
        state.set_plan(steps);
        state
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Steps not yet executed
    pub fn plan(&self) -> &VecDeque<String> {
        &self.plan
    }

    /// The plan as the planner produced it
    pub fn planned(&self) -> &[String] {
        &self.planned
    }

    pub fn intermediate_results(&self) -> &[String] {
        &self.intermediate_results
    }

    pub fn final_output(&self) -> Option<&str> {
        self.final_output.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn next_step(&self) -> Option<&str> {
        self.plan.front().map(String::as_str)
    }

    pub(crate) fn set_plan(&mut self, steps: Vec<String>) {
        debug_assert!(self.planned.is_empty() && self.plan.is_empty(), "plan set twice");
        self.planned = steps.clone();
        self.plan = steps.into();
        self.phase = Phase::Executing;
    }

    /// Drop the front step and record its result
    pub(crate) fn complete_step(&mut self, result: String) -> Option<String> {
        let step = self.plan.pop_front()?;
        self.intermediate_results.push(result);
        Some(step)
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn finish(&mut self, output: String) {
        debug_assert!(self.final_output.is_none(), "final output set twice");
        self.final_output = Some(output);
        self.phase = Phase::Done;
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<String>, Option<String>) {
        (self.planned, self.intermediate_results, self.final_output)
    }
}
