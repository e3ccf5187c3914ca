//! Domain Models
//!
//! Data shared by the engine's pipeline stages. Everything here is
//! process-local and lives for one scheduling tick, except identifiers that end
//! up in the [`DedupLedger`](crate::ledger::DedupLedger).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque platform identifier (post, mention, account)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Placement identifier of a post we created
pub type PostHandle = ItemId;

/// The bot's own account, resolved once at startup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: ItemId,
    pub handle: String,
}

/// A post addressed to or found by the bot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: ItemId,

    /// Author handle without the `@`; empty if the platform did not expand it
    #[serde(default)]
    pub author_handle: String,

    pub author_id: ItemId,

    pub text: String,
}

impl IncomingMessage {
    pub fn new(
        id: impl Into<String>,
        author_handle: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: ItemId::new(id),
            author_handle: author_handle.into(),
            author_id: ItemId::new(author_id),
            text: text.into(),
        }
    }

    /// Handle used when addressing the author in prompts
    pub fn display_handle(&self) -> &str {
        if self.author_handle.is_empty() {
            "trader"
        } else {
            &self.author_handle
        }
    }
}

/// Reply category, in priority order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Negative,
    Grateful,
    PriceRequest,
    Beginner,
    General,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Grateful => "grateful",
            Self::PriceRequest => "price_request",
            Self::Beginner => "beginner",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a reply body came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// Static curated pool
    Pool,
    /// Price template with interpolated snapshot
    Template,
    /// Accepted generative output
    Generated,
}

/// Candidate reply before the length and referral policy runs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyCandidate {
    pub body: String,
    pub within_limit: bool,
    pub source: ReplySource,
}

impl ReplyCandidate {
    pub fn new(body: impl Into<String>, source: ReplySource, ceiling: usize) -> Self {
        let body = body.into();
        let within_limit = char_len(&body) <= ceiling;
        Self {
            body,
            within_limit,
            source,
        }
    }
}

/// Long-form document to be chunked into a thread
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub title: String,
    pub source_url: String,
    pub long_body: String,
}

/// One post of a thread
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSegment {
    pub body: String,

    /// Index of the segment this one replies to
    pub parent: Option<usize>,
}

/// Headline from a news source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// Glossary entry for the educational post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term: String,
    pub definition: String,
}

/// BTC and ETH spot prices in USD
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub btc_usd: Decimal,
    pub eth_usd: Decimal,
}

impl std::fmt::Display for PriceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BTC: ${} | ETH: ${}",
            format_usd_whole(self.btc_usd),
            format_usd_whole(self.eth_usd)
        )
    }
}

/// Whole-dollar amount with comma thousands separators (`97500.8` -> `97,500`)
pub fn format_usd_whole(amount: Decimal) -> String {
    let digits = amount.trunc().abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount.is_sign_negative() && !amount.trunc().is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Aggregate market mood from recent posts
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketMood {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl std::fmt::Display for MarketMood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bullish => "bullish 🟢",
            Self::Bearish => "bearish 🔴",
            Self::Neutral => "neutral ⚪",
            Self::Unknown => "unknown ❓",
        })
    }
}

/// Mood plus whether it came from a real classifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub mood: MarketMood,

    /// True when produced by the random stub instead of a model
    pub degraded: bool,
}

/// Length in the platform's counting unit (Unicode scalar values)
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_snapshot_format() {
        let snapshot = PriceSnapshot {
            btc_usd: dec!(97500.87),
            eth_usd: dec!(3450),
        };
        assert_eq!(snapshot.to_string(), "BTC: $97,500 | ETH: $3,450");
    }

    #[test]
    fn test_format_usd_whole() {
        assert_eq!(format_usd_whole(dec!(0.52)), "0");
        assert_eq!(format_usd_whole(dec!(999)), "999");
        assert_eq!(format_usd_whole(dec!(1000)), "1,000");
        assert_eq!(format_usd_whole(dec!(1234567.9)), "1,234,567");
        assert_eq!(format_usd_whole(dec!(-1500)), "-1,500");
    }

    #[test]
    fn test_display_handle_fallback() {
        let anon = IncomingMessage::new("1", "", "42", "gm");
        assert_eq!(anon.display_handle(), "trader");
        let named = IncomingMessage::new("2", "satoshi", "43", "gm");
        assert_eq!(named.display_handle(), "satoshi");
    }

    #[test]
    fn test_candidate_limit_flag() {
        let short = ReplyCandidate::new("gm", ReplySource::Pool, 280);
        assert!(short.within_limit);
        let long = ReplyCandidate::new("x".repeat(281), ReplySource::Pool, 280);
        assert!(!long.within_limit);
    }

    #[test]
    fn test_char_len_counts_scalars() {
        assert_eq!(char_len("→ 🟢"), 3);
    }
}
