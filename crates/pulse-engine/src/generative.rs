//! Generative Fallback
//!
//! Thin wrapper over an [`LlmProvider`]: renders a prompt template, runs it
//! with the configured safety policy under a timeout, and flattens the output
//! to a single line. When no provider is configured the wrapper is disabled
//! and every call fails immediately, so callers always keep a static fallback.

use std::sync::Arc;
use std::time::Duration;

use agent_core::{GenerationOptions, LlmProvider, PromptParams, PromptTemplate, ProviderChain, SafetyPolicy};

use crate::error::{EngineError, Result};

pub struct GenerativeFallback {
    provider: Option<Arc<dyn LlmProvider>>,
    options: GenerationOptions,
    timeout: Duration,
}

impl GenerativeFallback {
    pub fn new(provider: Arc<dyn LlmProvider>, safety: SafetyPolicy, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            options: GenerationOptions::default().with_safety(safety),
            timeout,
        }
    }

    /// Failover over `providers`, each call bounded by `per_call`.
    ///
    /// The overall bound is the chain's worst case, so a later provider still
    /// gets its full turn after an earlier one hangs.
    pub fn from_chain(providers: Vec<Box<dyn LlmProvider>>, safety: SafetyPolicy, per_call: Duration) -> Self {
        let chain = ProviderChain::new(providers).with_timeout(per_call);
        let timeout = chain.budget().unwrap_or(per_call);
        Self::new(Arc::new(chain), safety, timeout)
    }

    /// A fallback with no backend; `generate` always fails
    pub fn disabled() -> Self {
        Self {
            provider: None,
            options: GenerationOptions::default(),
            timeout: Duration::ZERO,
        }
    }

    pub const fn enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub const fn safety(&self) -> SafetyPolicy {
        self.options.safety
    }

    /// Render `template` with `params` and return the flattened completion.
    pub async fn generate(&self, template: &PromptTemplate, params: &PromptParams) -> Result<String> {
        let Some(provider) = &self.provider else {
            return Err(EngineError::GenerationFailure("generator not configured".into()));
        };

        let messages = template.to_messages(params);
        let completion = tokio::time::timeout(self.timeout, provider.complete(&messages, &self.options))
            .await
            .map_err(|_| {
                EngineError::GenerationFailure(format!("timed out after {:?}", self.timeout))
            })??;

        let text = sanitize(&completion.content);
        if text.is_empty() {
            return Err(EngineError::GenerationFailure("empty completion".into()));
        }

        tracing::debug!(provider = provider.name(), chars = text.chars().count(), "Generated text");
        Ok(text)
    }
}

/// Trim, then turn every line break into one space.
///
/// Spacing around the breaks is kept as-is, so the length checked against the
/// reply acceptance window is the raw model output minus its outer padding.
pub fn sanitize(text: &str) -> String {
    text.trim().replace("\r\n", " ").replace('\n', " ")
}
