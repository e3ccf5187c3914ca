//! Engine Configuration
//!
//! Read from the environment (after `dotenvy` has loaded `.env` in the
//! binary). Unset or unparseable values fall back to the defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use agent_core::SafetyPolicy;

use crate::chunker::ChunkConfig;
use crate::policy::ReplyPolicy;
use crate::terms::DEFAULT_TERMS_PATH;

pub const DEFAULT_REFERRAL_LINK: &str = "https://www.bingx.com";

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Call-to-action link appended to posts and some replies
    pub referral_link: String,

    /// Send `BLOCK_NONE` for every harm category to the generator
    pub safety_filters_disabled: bool,

    pub terms_path: PathBuf,

    pub policy: ReplyPolicy,
    pub chunk: ChunkConfig,

    /// Upper bound for one generator call
    pub generation_timeout: Duration,

    /// Timeout for price and news requests
    pub http_timeout: Duration,

    pub thread_delay: Duration,
    pub mention_delay: Duration,
    pub repost_delay: Duration,

    pub mention_limit: usize,
    pub repost_limit: usize,

    /// Search query and sample size for the sentiment reading
    pub sentiment_query: String,
    pub sentiment_sample: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            referral_link: DEFAULT_REFERRAL_LINK.into(),
            safety_filters_disabled: true,
            terms_path: PathBuf::from(DEFAULT_TERMS_PATH),
            policy: ReplyPolicy::default(),
            chunk: ChunkConfig::default(),
            generation_timeout: Duration::from_secs(30),
            http_timeout: Duration::from_secs(5),
            thread_delay: Duration::from_secs(2),
            mention_delay: Duration::from_secs(3),
            repost_delay: Duration::from_secs(2),
            mention_limit: 20,
            repost_limit: 20,
            sentiment_query: "#bitcoin -is:retweet lang:en".into(),
            sentiment_sample: 15,
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    let value = raw.trim().parse().ok();
    if value.is_none() {
        tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
    }
    value
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    parsed::<u64>(lookup, key).map(Duration::from_secs)
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();

        let mut policy = d.policy.clone();
        match parsed::<f64>(&lookup, "PULSE_REFERRAL_PROBABILITY") {
            Some(p) if p.is_finite() => policy.referral_probability = p.clamp(0.0, 1.0),
            Some(p) => tracing::warn!(value = %p, "Ignoring non-finite PULSE_REFERRAL_PROBABILITY"),
            None => {}
        }

        let mut chunk = d.chunk.clone();
        if let Some(window) = parsed::<usize>(&lookup, "PULSE_CHUNK_WINDOW").filter(|w| *w > 0) {
            chunk.window = window;
        }

        Self {
            referral_link: lookup("REFERRAL_LINK")
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or(d.referral_link),
            safety_filters_disabled: parsed(&lookup, "PULSE_SAFETY_FILTERS_DISABLED")
                .unwrap_or(d.safety_filters_disabled),
            terms_path: lookup("PULSE_TERMS_PATH").map_or(d.terms_path, PathBuf::from),
            policy,
            chunk,
            generation_timeout: secs(&lookup, "PULSE_GENERATION_TIMEOUT_SECS").unwrap_or(d.generation_timeout),
            http_timeout: secs(&lookup, "PULSE_HTTP_TIMEOUT_SECS").unwrap_or(d.http_timeout),
            thread_delay: secs(&lookup, "PULSE_THREAD_DELAY_SECS").unwrap_or(d.thread_delay),
            mention_delay: secs(&lookup, "PULSE_MENTION_DELAY_SECS").unwrap_or(d.mention_delay),
            repost_delay: secs(&lookup, "PULSE_REPOST_DELAY_SECS").unwrap_or(d.repost_delay),
            mention_limit: parsed(&lookup, "PULSE_MENTION_LIMIT").unwrap_or(d.mention_limit),
            repost_limit: parsed(&lookup, "PULSE_REPOST_LIMIT").unwrap_or(d.repost_limit),
            sentiment_query: lookup("PULSE_SENTIMENT_QUERY").unwrap_or(d.sentiment_query),
            sentiment_sample: parsed(&lookup, "PULSE_SENTIMENT_SAMPLE").unwrap_or(d.sentiment_sample),
        }
    }

    pub const fn safety(&self) -> SafetyPolicy {
        SafetyPolicy::from_filters_disabled(self.safety_filters_disabled)
    }

    /// No pacing delays; for tests
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.thread_delay = Duration::ZERO;
        self.mention_delay = Duration::ZERO;
        self.repost_delay = Duration::ZERO;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> EngineConfig {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        EngineConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.referral_link, DEFAULT_REFERRAL_LINK);
        assert!(config.safety_filters_disabled);
        assert_eq!(config.safety(), SafetyPolicy::BlockNone);
        assert_eq!(config.terms_path, PathBuf::from("crypto_terms.json"));
        assert_eq!(config.chunk.window, 277);
        assert_eq!(config.generation_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("REFERRAL_LINK", "https://bingx.com/invite/abc"),
            ("PULSE_SAFETY_FILTERS_DISABLED", "false"),
            ("PULSE_TERMS_PATH", "/etc/pulse/terms.json"),
            ("PULSE_MENTION_DELAY_SECS", "0"),
            ("PULSE_REFERRAL_PROBABILITY", "1.7"),
            ("PULSE_CHUNK_WINDOW", "250"),
        ]);
        assert_eq!(config.referral_link, "https://bingx.com/invite/abc");
        assert_eq!(config.safety(), SafetyPolicy::ProviderDefault);
        assert_eq!(config.terms_path, PathBuf::from("/etc/pulse/terms.json"));
        assert_eq!(config.mention_delay, Duration::ZERO);
        assert!((config.policy.referral_probability - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.chunk.window, 250);
    }

    #[test]
    fn test_garbage_values_keep_defaults() {
        let config = from_pairs(&[("PULSE_MENTION_LIMIT", "lots"), ("REFERRAL_LINK", "  "), ("PULSE_CHUNK_WINDOW", "0")]);
        assert_eq!(config.mention_limit, 20);
        assert_eq!(config.referral_link, DEFAULT_REFERRAL_LINK);
        assert_eq!(config.chunk.window, 277);
    }

    #[test]
    fn test_non_finite_probability_keeps_default() {
        for raw in ["NaN", "inf", "-inf"] {
            let config = from_pairs(&[("PULSE_REFERRAL_PROBABILITY", raw)]);
            assert!((config.policy.referral_probability - 0.3).abs() < f64::EPSILON, "{raw}");
        }
    }
}
