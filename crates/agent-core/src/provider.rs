//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for text-generation backends (Gemini, Ollama, ...)
//! so the content engine can ask for text without knowing which model answers.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider, SafetyPolicy};
//!
//! let options = GenerationOptions::default().with_safety(SafetyPolicy::BlockNone);
//! let completion = provider.complete(&messages, &options).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::Message;

/// Content-filter categories a provider may enforce.
pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Content filtering requested from the provider.
///
/// `BlockNone` turns every category in [`HARM_CATEGORIES`] off. The bot's
/// persona is deliberately abrasive and the provider filters reject much of it,
/// so this is an operator decision carried as an explicit flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPolicy {
    /// Whatever the provider enforces by default
    #[default]
    ProviderDefault,
    /// All content filter categories disabled
    BlockNone,
}

impl SafetyPolicy {
    pub const fn from_filters_disabled(disabled: bool) -> Self {
        if disabled {
            Self::BlockNone
        } else {
            Self::ProviderDefault
        }
    }

    pub const fn filters_disabled(self) -> bool {
        matches!(self, Self::BlockNone)
    }
}

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model override; `None` uses the provider's configured model
    #[serde(default)]
    pub model: Option<String>,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Content filtering
    #[serde(default)]
    pub safety: SafetyPolicy,
}

const fn default_temperature() -> f32 { 0.9 }
const fn default_max_tokens() -> u32 { 1024 }
const fn default_top_p() -> f32 { 0.95 }

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            safety: SafetyPolicy::default(),
        }
    }
}

impl GenerationOptions {
    #[must_use]
    pub fn with_safety(mut self, safety: SafetyPolicy) -> Self {
        self.safety = safety;
        self
    }

    /// Resolve the model name against a provider default
    pub fn model_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.model.as_deref().unwrap_or(fallback)
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human readable provider name, used in logs
    fn name(&self) -> &str;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

/// Ordered providers, tried one after another until one answers
pub struct ProviderChain {
    providers: Vec<Box<dyn LlmProvider>>,
    per_call_timeout: Option<Duration>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Self {
        Self {
            providers,
            per_call_timeout: None,
        }
    }

    /// Bound every individual provider call
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = Some(timeout);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Worst-case time for one `complete` call: every provider running out
    /// its per-call bound. `None` when calls are unbounded.
    pub fn budget(&self) -> Option<Duration> {
        let attempts = u32::try_from(self.providers.len()).unwrap_or(u32::MAX);
        self.per_call_timeout.map(|limit| limit.saturating_mul(attempts.max(1)))
    }

    async fn call(
        &self,
        provider: &dyn LlmProvider,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        match self.per_call_timeout {
            Some(limit) => tokio::time::timeout(limit, provider.complete(messages, options))
                .await
                .map_err(|_| AgentError::Timeout(limit.as_secs()))?,
            None => provider.complete(messages, options).await,
        }
    }
}

#[async_trait]
impl LlmProvider for ProviderChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn health_check(&self) -> Result<bool> {
        for provider in &self.providers {
            if provider.health_check().await.unwrap_or(false) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        if self.providers.is_empty() {
            return Err(AgentError::Config("provider chain is empty".into()));
        }

        let attempts = self.providers.len();
        let mut last_error = None;

        for provider in &self.providers {
            let provider = provider.as_ref();
            match self.call(provider, messages, options).await {
                Ok(completion) => return Ok(completion),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Provider failed");
                    last_error = Some(e);
                }
            }
        }

        match (attempts, last_error) {
            (1, Some(e)) => Err(e),
            _ => Err(AgentError::Exhausted(attempts)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        reply: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.reply.is_some())
        }

        async fn complete(&self, _: &[Message], _: &GenerationOptions) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Some(text) => Ok(Completion {
                    content: text.into(),
                    model: self.name.into(),
                    usage: None,
                    finish_reason: Some(FinishReason::Stop),
                }),
                None => Err(AgentError::ProviderUnavailable(self.name.into())),
            }
        }
    }

    fn scripted(name: &'static str, reply: Option<&'static str>) -> (Box<dyn LlmProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Box::new(Scripted { name, reply, calls: calls.clone() }), calls)
    }

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!(opts.model.is_none());
        assert_eq!(opts.max_tokens, 1024);
        assert_eq!(opts.safety, SafetyPolicy::ProviderDefault);
        assert_eq!(opts.model_or("gemini-1.5-flash"), "gemini-1.5-flash");
    }

    #[test]
    fn test_safety_flag() {
        assert_eq!(SafetyPolicy::from_filters_disabled(true), SafetyPolicy::BlockNone);
        assert!(SafetyPolicy::BlockNone.filters_disabled());
        assert!(!SafetyPolicy::ProviderDefault.filters_disabled());
    }

    #[tokio::test]
    async fn test_failover_moves_to_next_provider() {
        let (down, down_calls) = scripted("down", None);
        let (up, up_calls) = scripted("up", Some("gm"));
        let chain = ProviderChain::new(vec![down, up]);

        let completion = chain.complete(&[Message::user("hi")], &GenerationOptions::default()).await.unwrap();
        assert_eq!(completion.content, "gm");
        assert_eq!(completion.model, "up");
        assert_eq!(down_calls.load(Ordering::SeqCst), 1);
        assert_eq!(up_calls.load(Ordering::SeqCst), 1);
        assert!(chain.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_exhausted_chain() {
        let (a, _) = scripted("a", None);
        let (b, _) = scripted("b", None);
        let chain = ProviderChain::new(vec![a, b]);

        let err = chain.complete(&[], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::Exhausted(2)));
    }

    #[tokio::test]
    async fn test_single_provider_error_passes_through() {
        let (a, _) = scripted("a", None);
        let chain = ProviderChain::new(vec![a]);

        let err = chain.complete(&[], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_budget_covers_every_provider() {
        let (a, _) = scripted("a", None);
        let (b, _) = scripted("b", None);
        let chain = ProviderChain::new(vec![a, b]);
        assert_eq!(chain.budget(), None);

        let chain = chain.with_timeout(Duration::from_secs(30));
        assert_eq!(chain.budget(), Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_empty_chain_is_config_error() {
        let chain = ProviderChain::new(Vec::new());
        assert!(chain.is_empty());
        let err = chain.complete(&[], &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }
}
