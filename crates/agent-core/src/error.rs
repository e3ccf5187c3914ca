//! Error Types

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider did not answer within the configured bound
    #[error("Provider timed out after {0}s")]
    Timeout(u64),

    /// Provider answered but the payload could not be used
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Every provider in a chain failed
    #[error("All {0} providers failed")]
    Exhausted(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rate limited / quota exhausted
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AgentError::Timeout(5).to_string(), "Provider timed out after 5s");
        assert_eq!(AgentError::Exhausted(2).to_string(), "All 2 providers failed");
    }
}
