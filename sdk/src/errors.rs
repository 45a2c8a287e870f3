//! Error types and handling
//!
//! This module provides the error types used throughout the JobPlanner engine.
//! All errors implement the `EngineErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry API keys. Provider failures are reported with
//! the upstream status and body only.

use thiserror::Error;

/// Trait for JobPlanner error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait EngineErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller with the same or a
    /// corrected request. Non-recoverable errors require a configuration fix.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration, missing API keys
/// - **LLM Provider**: API failures, timeouts, structured output mismatches
/// - **Web Search**: Search API failures
/// - **Job Store**: Unreadable or corrupt job files
/// - **Request**: Invalid input at the boundary
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, EngineErrorExt};
///
/// let error = EngineError::SchemaValidation("missing field `steps`".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("NEBIUS_API_KEY not set".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out")]
    LLMTimeout,

    #[error("Structured output did not match schema: {0}")]
    SchemaValidation(String),

    // Tool errors
    #[error("Web search error: {0}")]
    WebSearch(String),

    #[error("Job store error: {0}")]
    JobStore(String),

    // Boundary errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file and API key environment variables",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",
            Self::LLMTimeout => "LLM provider took too long to respond. Try again",
            Self::SchemaValidation(_) => {
                "The model returned an invalid plan. Try rephrasing the request"
            }

            Self::WebSearch(_) => "Web search failed. Check TAVILY_API_KEY and your connection",
            Self::JobStore(_) => "A job file could not be read or written. Check the jobs directory",

            Self::InvalidRequest(_) => "The request is missing required fields",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(!EngineError::Config("x".into()).is_recoverable());
        assert!(EngineError::LLMTimeout.is_recoverable());
        assert!(EngineError::WebSearch("down".into()).is_recoverable());
        assert!(EngineError::InvalidRequest("empty".into()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
        assert_eq!(err.user_hint(), "File system operation failed");
    }

    #[test]
    fn test_display_includes_detail() {
        let err = EngineError::SchemaValidation("missing field `steps`".into());
        assert!(err.to_string().contains("missing field `steps`"));
    }
}
