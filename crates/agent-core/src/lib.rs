//! # agent-core
//!
//! Provider-agnostic LLM abstraction used by the crypto-pulse content engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      pulse-engine                             │
//! │  ┌────────────────┐   ┌────────────────┐   ┌───────────────┐  │
//! │  │ PromptTemplate │──▶│ ProviderChain  │──▶│  LlmProvider  │  │
//! │  │  + Params      │   │ (failover)     │   │  (Strategy)   │  │
//! │  └────────────────┘   └────────────────┘   └───────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the bot swap Gemini, Ollama or a test double
//! without touching content logic.

pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;

pub use error::{AgentError, Result};
pub use message::{Message, Role};
pub use prompt::{PromptParams, PromptTemplate};
pub use provider::{
    Completion, GenerationOptions, LlmProvider, ProviderChain, SafetyPolicy,
};
