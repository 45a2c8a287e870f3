//! JobPlanner SDK
//!
//! Shared library providing error and wire types for JobPlanner components.
//! This crate is used by both the engine and the API server.

/// Error types and handling
pub mod errors;

/// Job record and HTTP request/response types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, EngineErrorExt};
pub use types::{
    ErrorResponse, HealthResponse, JobRecord, PlanRequest, PlanResponse, PlanWithJobRequest,
    PlanWithJobResponse, SaveJobRequest, SaveJobResponse,
};
