//! Conductor Orchestrator
//!
//! Runs Planner → Executor (looped by the router) → Synthesizer for one request.

use sdk::errors::EngineError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use crate::conductor::executor::Executor;
use crate::conductor::planner::Planner;
use crate::conductor::router::next_phase;
use crate::conductor::synthesizer::Synthesizer;
use crate::conductor::types::{Phase, RouteDecision, RunState};
use crate::llm::{LLMProvider, Message};
use crate::tools::ToolRegistry;

/// A completed run
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub final_output: String,
    /// One entry per executed step, in step order
    pub intermediate_results: Vec<String>,
    /// The plan as produced by the planner
    pub plan: Vec<String>,
}

/// A run that stopped on its first unrecovered error
#[derive(Debug, thiserror::Error)]
#[error("run aborted while {phase}: {source}")]
pub struct RunFailure {
    pub phase: Phase,
    #[source]
    pub source: EngineError,
    /// Results collected before the failure
    pub intermediate_results: Vec<String>,
}

impl RunFailure {
    fn new(mut state: RunState, source: EngineError) -> Self {
        let phase = state.phase();
        state.set_phase(Phase::Aborted);
        let (_, intermediate_results, _) = state.into_parts();
        warn!(phase = %phase, error = %source, "Run aborted");
        Self {
            phase,
            source,
            intermediate_results,
        }
    }
}

pub struct Orchestrator {
    planner: Planner,
    executor: Executor,
    synthesizer: Synthesizer,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LLMProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            planner: Planner::new(Arc::clone(&llm)),
            executor: Executor::new(Arc::clone(&llm), tools),
            synthesizer: Synthesizer::new(llm),
        }
    }

    /// Plan, execute every step, then synthesize.
    ///
    /// The executor always runs at least once (an empty plan is a no-op) and
    /// the router decides after each step. Synthesis runs exactly once.
    pub async fn run(
        &self,
        user_input: &str,
        history: Vec<Message>,
    ) -> Result<RunOutput, RunFailure> {
        let span = info_span!("run", user_input_length = user_input.len());
        self.run_inner(RunState::with_history(user_input, history))
            .instrument(span)
            .await
    }

    async fn run_inner(&self, mut state: RunState) -> Result<RunOutput, RunFailure> {
        let start = Instant::now();

        let steps = match self.planner.plan(state.user_input(), state.messages()).await {
            Ok(steps) => steps,
            Err(e) => return Err(RunFailure::new(state, e)),
        };
        state.set_plan(steps);

        loop {
            if let Err(e) = self.executor.execute_step(&mut state).await {
                return Err(RunFailure::new(state, e));
            }
            match next_phase(&state) {
                RouteDecision::ContinueExecuting => continue,
                RouteDecision::Synthesize => break,
            }
        }

        state.set_phase(Phase::Synthesizing);
        let output = match self
            .synthesizer
            .synthesize(state.user_input(), state.intermediate_results())
            .await
        {
            Ok(output) => output,
            Err(e) => return Err(RunFailure::new(state, e)),
        };
        state.finish(output);

        let (plan, intermediate_results, final_output) = state.into_parts();
        info!(
            steps_executed = intermediate_results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Run complete"
        );

        Ok(RunOutput {
            final_output: final_output.unwrap_or_default(),
            intermediate_results,
            plan,
        })
    }
}
