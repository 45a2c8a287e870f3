//! JobPlanner Engine Library
//!
//! Plans a request into tool steps, runs them against web search and a local
//! job store, and synthesizes the answer. Used by the CLI binary, the HTTP API
//! server and the integration tests.

/// Configuration management module
pub mod config;

/// Secret handling for API keys
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Tool catalogue, web search and dispatch
pub mod tools;

/// Job posting parsing and the JSON job store
pub mod jobs;

/// Plan → execute → synthesize loop
pub mod conductor;

/// Workflows shared by the CLI and the API
pub mod service;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
