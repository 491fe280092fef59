//! ============================================================================
//! Error Types - Failure kinds for startup loading and per-turn dispatch
//! ============================================================================
//! Startup errors (config, memory table) are fatal and surface before the
//! chat loop starts. Retrieval errors degrade a turn to zero context.
//! Completion errors fail only the current turn.
//! ============================================================================

use std::path::PathBuf;

/// Failure to load or resolve the YAML configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("No API key configured (set openai.api_key in the config file or OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failure to load the memory table from disk
#[derive(Debug, thiserror::Error)]
pub enum MemoryLoadError {
    #[error("Failed to read memory table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed memory table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Memory table {path} has no 'text' or 'content' column")]
    MissingTextColumn { path: PathBuf },

    #[error("Invalid embedding in row {row}: {reason}")]
    InvalidEmbedding { row: usize, reason: String },
}

/// Failure while retrieving memory context for a query
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetrievalError {
    #[error("Embedding failed: {0}")]
    Embedding(String),
}

/// Failure of a single completion request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    #[error("Authentication rejected by completion API: {0}")]
    Auth(String),

    #[error("Rate limited by completion API: {0}")]
    RateLimited(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Completion request timed out")]
    TimedOut,

    #[error("Completion API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Whether a retry has a chance of succeeding
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::RateLimited(_)
            | CompletionError::Transport(_)
            | CompletionError::TimedOut => true,
            CompletionError::Api { status, .. } => *status >= 500,
            CompletionError::Auth(_) | CompletionError::InvalidResponse(_) => false,
        }
    }

    /// Map a reqwest send/read failure onto an error kind
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::TimedOut
        } else if err.is_decode() {
            CompletionError::InvalidResponse(err.to_string())
        } else {
            CompletionError::Transport(err.to_string())
        }
    }
}
