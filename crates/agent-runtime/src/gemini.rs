//! Gemini LLM Provider
//!
//! `LlmProvider` over the Gemini `generateContent` REST endpoint. The safety
//! policy from `GenerationOptions` maps onto Gemini's per-category
//! `safetySettings`.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{split_system, Message, Role},
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, SafetyPolicy, TokenUsage,
        HARM_CATEGORIES,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key (`GEMINI_API_KEY`)
    pub api_key: String,

    /// Model used when the request does not override it
    pub model: String,

    /// API base, overridable for tests
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            timeout_secs: 30,
        }
    }

    /// `None` when no key is configured; the generator is then disabled.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(secs) = std::env::var("GEMINI_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()) {
            config.timeout_secs = secs;
        }
        Some(config)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

fn safety_settings(policy: SafetyPolicy) -> Vec<SafetySetting> {
    match policy {
        SafetyPolicy::ProviderDefault => Vec::new(),
        SafetyPolicy::BlockNone => HARM_CATEGORIES
            .iter()
            .copied()
            .map(|category| SafetySetting {
                category,
                threshold: "BLOCK_NONE",
            })
            .collect(),
    }
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" => FinishReason::ContentFilter,
        _ => FinishReason::Error,
    }
}

// ============================================================================
// Provider
// ============================================================================

/// Gemini LLM provider
pub struct GeminiProvider {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn build_request(messages: &[Message], options: &GenerationOptions) -> GenerateRequest {
        let (system, rest) = split_system(messages);
        let system_instruction = system.map(|text| Content {
            role: None,
            parts: vec![Part { text }],
        });

        let contents = rest
            .into_iter()
            .map(|m| Content {
                role: Some(if m.role == Role::Assistant { "model" } else { "user" }),
                parts: vec![Part { text: m.content.clone() }],
            })
            .collect();

        GenerateRequest {
            contents,
            system_instruction,
            safety_settings: safety_settings(options.safety),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
            },
        }
    }

    fn parse_response(body: GenerateResponse, model: &str) -> Result<Completion> {
        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::MalformedResponse("no candidates returned".into()))?;

        let finish_reason = candidate.finish_reason.as_deref().map(map_finish_reason);
        let content: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(AgentError::MalformedResponse(format!(
                "empty candidate (finish reason {finish_reason:?})"
            )));
        }

        Ok(Completion {
            content,
            model: model.to_string(),
            usage: body.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models/{}", self.config.base_url, self.config.model);
        match self.http.get(url).header("x-goog-api-key", &self.config.api_key).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                tracing::warn!("Gemini health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let model = options.model_or(&self.config.model).to_string();
        let url = format!("{}/models/{}:generateContent", self.config.base_url, model);
        let request = Self::build_request(messages, options);

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::Timeout(self.config.timeout_secs)
                } else {
                    AgentError::ProviderUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
                s if s.is_server_error() => AgentError::ProviderUnavailable(format!("{s}: {detail}")),
                s => AgentError::Provider(format!("{s}: {detail}")),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(e.to_string()))?;

        Self::parse_response(body, &model)
    }
}
