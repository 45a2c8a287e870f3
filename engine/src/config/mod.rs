//! Configuration management
//!
//! This module handles loading, validation, and management of the JobPlanner configuration.
//! Configuration is stored in TOML format at ~/.jobplanner/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory, jobs directory
//! - **llm**: Default provider, request timeout and per-provider settings
//! - **search**: Tavily web search settings
//! - **jobs**: How raw job descriptions are turned into records
//! - **server**: HTTP API bind address
//!
//! API keys never live in this file. Provider sections name the environment
//! variable that holds the key (`api_key_env`).
//!
//! # Path Expansion
//!
//! `~` is expanded to the user's home directory for `data_dir` and `jobs_dir`.
//! A relative `jobs_dir` is resolved against the working directory when the
//! job store opens it.
//!
//! # Examples
//!
//! ```no_run
//! use jobplanner_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//!
//! println!("Jobs directory: {:?}", config.core.jobs_dir);
//! println!("Default provider: {}", config.llm.default_provider);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Job parsing configuration
    #[serde(default)]
    pub jobs: JobsConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory holding one JSON file per job listing
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: PathBuf,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (nebius, openai, ollama)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Nebius AI Studio settings (OpenAI-compatible)
    #[serde(default = "RemoteProviderConfig::nebius")]
    pub nebius: RemoteProviderConfig,

    /// OpenAI settings
    #[serde(default = "RemoteProviderConfig::openai")]
    pub openai: RemoteProviderConfig,

    /// Ollama settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Settings for a hosted OpenAI-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteProviderConfig {
    pub base_url: String,
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl RemoteProviderConfig {
    fn nebius() -> Self {
        Self {
            base_url: "https://api.studio.nebius.com/v1".to_string(),
            model: "Qwen/Qwen3-14B".to_string(),
            api_key_env: "NEBIUS_API_KEY".to_string(),
        }
    }

    fn openai() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

/// Tavily web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Results returned per query
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,
}

/// How raw job text becomes a [`sdk::JobRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Regex section parser, no model call
    Heuristic,
    /// Structured model call
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_extractor")]
    pub extractor: ExtractorKind,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.jobplanner")
}

fn default_jobs_dir() -> PathBuf {
    PathBuf::from("data/jobs")
}

fn default_provider() -> String {
    "nebius".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen3:14b".to_string()
}

fn default_search_base_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> u32 {
    2
}

fn default_search_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_extractor() -> ExtractorKind {
    ExtractorKind::Heuristic
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
            jobs_dir: default_jobs_dir(),
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            timeout_secs: default_timeout_secs(),
            nebius: RemoteProviderConfig::nebius(),
            openai: RemoteProviderConfig::openai(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            max_results: default_max_results(),
            api_key_env: default_search_key_env(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            extractor: default_extractor(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    ///
    /// # Errors
    /// Returns `EngineError::Config` if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Write the default configuration to `path` and return it
    pub fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Created default config at {}", path.display());

        let mut config = Self::default();
        config.validate_and_process()?;
        Ok(config)
    }

    /// `~/.jobplanner/config.toml`
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".jobplanner").join("config.toml"))
    }

    /// Validate enumerated values and expand paths
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_providers = ["nebius", "openai", "ollama"];
        if !valid_providers.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                valid_providers.join(", ")
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(EngineError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.search.max_results == 0 {
            return Err(EngineError::Config(
                "max_results must be greater than 0".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        self.core.jobs_dir = expand_path(&self.core.jobs_dir)?;

        Ok(())
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.core.jobs_dir, PathBuf::from("data/jobs"));
        assert_eq!(config.llm.default_provider, "nebius");
        assert_eq!(config.llm.nebius.model, "Qwen/Qwen3-14B");
        assert_eq!(config.llm.nebius.api_key_env, "NEBIUS_API_KEY");
        assert_eq!(config.search.max_results, 2);
        assert_eq!(config.jobs.extractor, ExtractorKind::Heuristic);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let mut config: Config = toml::from_str("").unwrap();
        config.validate_and_process().unwrap();
        assert_eq!(config.search.base_url, "https://api.tavily.com");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [llm]
            default_provider = "ollama"

            [jobs]
            extractor = "llm"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.default_provider, "ollama");
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.llm.nebius.base_url, "https://api.studio.nebius.com/v1");
        assert_eq!(config.jobs.extractor, ExtractorKind::Llm);
    }

    #[test]
    fn test_invalid_provider_rejected() {
        let mut config = Config::default();
        config.llm.default_provider = "anthropic".to_string();
        let err = config.validate_and_process().unwrap_err();
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = Config::default();
        config.core.log_level = "verbose".to_string();
        assert!(config.validate_and_process().is_err());
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = expand_path(&PathBuf::from("~/test")).unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_relative_untouched() {
        let expanded = expand_path(&PathBuf::from("data/jobs")).unwrap();
        assert_eq!(expanded, PathBuf::from("data/jobs"));
    }
}
