//! Routing between executor iterations

use crate::conductor::types::{RouteDecision, RunState};

/// Keep executing while steps remain, otherwise synthesize.
///
/// Only consulted after an executor step, never before the first one.
pub fn next_phase(state: &RunState) -> RouteDecision {
    let decision = if state.plan().is_empty() {
        RouteDecision::Synthesize
    } else {
        RouteDecision::ContinueExecuting
    };

    tracing::debug!(
        node = "router",
        remaining_steps = state.plan().len(),
        decision = ?decision,
        "Routing decision"
    );
    decision
}
