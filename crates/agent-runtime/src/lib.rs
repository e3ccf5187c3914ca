//! # agent-runtime
//!
//! Concrete `LlmProvider` backends for crypto-pulse.
//!
//! ## Providers
//!
//! - **Gemini** (default): hosted generation, honours `SafetyPolicy`
//! - **Ollama** (default): local inference, used as failover
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{GeminiConfig, GeminiProvider};
//!
//! let provider = GeminiProvider::from_config(GeminiConfig::new(key))?;
//! let chain = ProviderChain::new(vec![Box::new(provider)]).with_timeout(limit);
//! ```

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiProvider};

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

// Re-export core types for convenience
pub use agent_core::{
    AgentError, GenerationOptions, LlmProvider, Message, ProviderChain, Result,
    Role, SafetyPolicy,
};
