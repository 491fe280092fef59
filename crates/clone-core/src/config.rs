//! ============================================================================
//! Configuration - YAML config file for credentials and memory settings
//! ============================================================================
//! Read once at startup and passed by reference into the API clients.
//!
//! ```yaml
//! openai:
//!   api_key: "sk-..."
//!   model: "gpt-3.5-turbo"
//! memory:
//!   path: "memories.csv"
//!   top_k: 5
//! ```
//! ============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Default config file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Environment variable consulted when the config file has no API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_MEMORY_PATH: &str = "memories.csv";
pub const DEFAULT_TOP_K: usize = 5;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    pub openai: OpenAiConfig,
    pub memory: MemoryConfig,
    /// Replaces the built-in persona text for self-aware turns
    pub persona: Option<String>,
}

/// Settings for the OpenAI-compatible completion and embedding endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Where the memory table lives and how much of it to inject per turn
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub path: PathBuf,
    pub top_k: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MEMORY_PATH),
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl CloneConfig {
    /// Load the config file and resolve the API key against the environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::read(path)?.resolve(std::env::var(API_KEY_ENV).ok())
    }

    /// Read and parse the config file without requiring an API key
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading config from {}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&raw, path)
    }

    /// Parse YAML without validating; `path` is only used for error reporting
    pub fn from_yaml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        // An empty document deserializes to `null`, which serde_yaml rejects for structs
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill the API key from `env_api_key` when the file has none, then validate
    pub fn resolve(mut self, env_api_key: Option<String>) -> Result<Self, ConfigError> {
        if self.openai.api_key.trim().is_empty() {
            match env_api_key.filter(|k| !k.trim().is_empty()) {
                Some(key) => {
                    debug!("Using API key from {}", API_KEY_ENV);
                    self.openai.api_key = key;
                }
                None => return Err(ConfigError::MissingApiKey),
            }
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.model.trim().is_empty() {
            return Err(ConfigError::Invalid("openai.model must not be empty".into()));
        }
        if self.openai.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("openai.base_url must not be empty".into()));
        }
        if self.openai.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "openai.timeout_secs must be greater than zero".into(),
            ));
        }
        if let Some(t) = self.openai.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "openai.temperature must be between 0 and 2, got {}",
                    t
                )));
            }
        }
        Ok(())
    }
}
