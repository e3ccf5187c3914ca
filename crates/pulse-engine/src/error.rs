//! Error Types for the Content Engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Platform refused the call because of rate limiting. Aborts the batch.
    #[error("Rate limited by {0}")]
    RateLimited(String),

    /// Network failure or timeout talking to any collaborator
    #[error("Transport error: {0}")]
    Transport(String),

    /// Generative backend disabled, errored or returned unusable text
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// Every news source came back empty
    #[error("No content available from {0} sources")]
    NoContentAvailable(usize),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the current batch must stop instead of moving to the next item
    pub const fn aborts_batch(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

impl From<agent_core::AgentError> for EngineError {
    fn from(err: agent_core::AgentError) -> Self {
        Self::GenerationFailure(err.to_string())
    }
}
