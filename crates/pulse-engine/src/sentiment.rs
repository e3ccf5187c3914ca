//! Market Sentiment
//!
//! Aggregates the mood of recent posts into a [`MarketMood`]. The LLM-backed
//! analyzer labels each post individually; the stub exists for deployments
//! with no model at all and marks every reading as degraded.

use std::sync::{Arc, Mutex, PoisonError};

use agent_core::PromptParams;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::generative::GenerativeFallback;
use crate::model::{MarketMood, SentimentReading};
use crate::prompts::SENTIMENT_LABEL;

/// Posts labelled per reading
pub const MAX_LABELLED: usize = 10;

/// Per-post input cap, in chars
pub const MAX_POST_CHARS: usize = 512;

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, texts: &[String]) -> SentimentReading;

    /// True for analyzers that do not actually look at the text
    fn is_degraded(&self) -> bool {
        false
    }
}

/// Majority vote of positive against negative labels
pub fn mood_from_counts(positive: usize, negative: usize) -> MarketMood {
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => MarketMood::Bullish,
        std::cmp::Ordering::Less => MarketMood::Bearish,
        std::cmp::Ordering::Equal => MarketMood::Neutral,
    }
}

enum Label {
    Positive,
    Negative,
    Neutral,
}

fn parse_label(answer: &str) -> Label {
    let answer = answer.to_lowercase();
    if answer.contains("positive") {
        Label::Positive
    } else if answer.contains("negative") {
        Label::Negative
    } else {
        Label::Neutral
    }
}

pub struct LlmSentiment {
    generator: Arc<GenerativeFallback>,
}

impl LlmSentiment {
    pub fn new(generator: Arc<GenerativeFallback>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl SentimentAnalyzer for LlmSentiment {
    async fn analyze(&self, texts: &[String]) -> SentimentReading {
        let (mut positive, mut negative) = (0, 0);

        for text in texts.iter().take(MAX_LABELLED) {
            let post: String = text.chars().take(MAX_POST_CHARS).collect();
            let params = PromptParams::new().set("text", post);
            match self.generator.generate(&SENTIMENT_LABEL, &params).await {
                Ok(answer) => match parse_label(&answer) {
                    Label::Positive => positive += 1,
                    Label::Negative => negative += 1,
                    Label::Neutral => {}
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Sentiment labelling failed");
                    return SentimentReading {
                        mood: MarketMood::Unknown,
                        degraded: false,
                    };
                }
            }
        }

        tracing::debug!(positive, negative, total = texts.len().min(MAX_LABELLED), "Labelled posts");
        SentimentReading {
            mood: mood_from_counts(positive, negative),
            degraded: false,
        }
    }
}

/// Random mood, flagged as degraded
pub struct StubSentiment {
    rng: Mutex<StdRng>,
}

impl StubSentiment {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for StubSentiment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentAnalyzer for StubSentiment {
    async fn analyze(&self, _texts: &[String]) -> SentimentReading {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mood = [MarketMood::Bullish, MarketMood::Bearish, MarketMood::Neutral]
            .choose(&mut *rng)
            .copied()
            .unwrap_or(MarketMood::Neutral);
        SentimentReading { mood, degraded: true }
    }

    fn is_degraded(&self) -> bool {
        true
    }
}
