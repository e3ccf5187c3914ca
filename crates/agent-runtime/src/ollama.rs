//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference. Used as the
//! failover behind Gemini, or alone when no Gemini key is configured.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage, ChatMessageResponse, MessageRole},
    models::ModelOptions,
    Ollama,
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Model used when the request does not override it
    pub model: String,

    /// Upper bound for a single chat call in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
            timeout_secs: 60,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let host = std::env::var("OLLAMA_HOST").unwrap_or(defaults.host);
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let model = std::env::var("OLLAMA_MODEL").unwrap_or(defaults.model);
        let timeout_secs = std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            host,
            port,
            model,
            timeout_secs,
        }
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create from configuration.
    ///
    /// The host is validated up front because the client panics on a bad URL.
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        reqwest::Url::parse(&config.host)
            .map_err(|e| AgentError::Config(format!("invalid OLLAMA_HOST {}: {e}", config.host)))?;

        Ok(Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Convert prompt messages to Ollama format
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    /// Convert Ollama response to a completion
    fn convert_completion(response: ChatMessageResponse, model: &str) -> Completion {
        let usage = response.final_data.as_ref().map(|d| {
            let prompt = u32::try_from(d.prompt_eval_count).unwrap_or(u32::MAX);
            let completion = u32::try_from(d.eval_count).unwrap_or(u32::MAX);
            TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt.saturating_add(completion),
            }
        });

        Completion {
            content: response.message.content,
            model: model.to_string(),
            usage,
            finish_reason: Some(FinishReason::Stop),
        }
    }

    /// Build Ollama model options
    fn build_options(opts: &GenerationOptions) -> ModelOptions {
        ModelOptions::default()
            .temperature(opts.temperature)
            .top_p(opts.top_p)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(models) => Ok(models.iter().any(|m| m.name.starts_with(&self.config.model))),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        if options.safety.filters_disabled() {
            // Local models ship without provider-side filters.
            tracing::trace!("Ollama has no safety settings to relax");
        }

        let model = options.model_or(&self.config.model).to_string();
        let request = ChatMessageRequest::new(model.clone(), Self::convert_messages(messages))
            .options(Self::build_options(options));

        let limit = Duration::from_secs(self.config.timeout_secs);
        let response = tokio::time::timeout(limit, self.client.send_chat_messages(request))
            .await
            .map_err(|_| AgentError::Timeout(self.config.timeout_secs))?
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        Ok(Self::convert_completion(response, &model))
    }
}
