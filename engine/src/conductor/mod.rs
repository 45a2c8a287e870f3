//! Conductor System
//!
//! The plan → execute → synthesize loop behind every planning request.

pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod router;
pub mod synthesizer;
pub mod types;

pub use executor::Executor;
pub use orchestrator::{Orchestrator, RunFailure, RunOutput};
pub use planner::{Planner, PLANNER_SYSTEM};
pub use router::next_phase;
pub use synthesizer::Synthesizer;
pub use types::{Phase, RouteDecision, RunState, Step, StepOutcome};
