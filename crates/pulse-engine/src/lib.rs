//! # pulse-engine
//!
//! Content generation and reply-decision engine for a crypto market bot.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │   mention    │──►│ classifier │──►│ response selector│──►│ reply policy │──► reply
//! └──────────────┘   └────────────┘   │  pools / prices  │   │ ref · 280 ·  │
//!                                     │  generative      │   │ challenge    │
//!                                     └──────────────────┘   └──────────────┘
//!
//! ┌──────────────┐   ┌────────────┐   ┌──────────────────┐
//! │ news/prices  │──►│ generative │──►│ chunker → thread │──► linked posts
//! └──────────────┘   │ or template│   └──────────────────┘
//!                    └────────────┘
//! ```
//!
//! Every external system sits behind a trait ([`SocialPlatform`],
//! [`PriceSource`], [`NewsSource`], [`SentimentAnalyzer`] and
//! `agent_core::LlmProvider`), so the engine runs against in-memory mocks in
//! tests and in dry-run mode.

pub mod actions;
pub mod chunker;
pub mod classifier;
pub mod config;
pub mod error;
pub mod generative;
pub mod ledger;
pub mod market;
pub mod model;
pub mod news;
pub mod platform;
pub mod policy;
pub mod prompts;
pub mod selector;
pub mod sentiment;
pub mod terms;
pub mod thread;

pub use actions::{Action, ActionOutcome, ActionReport, Collaborators, PulseAgent};
pub use chunker::{chunk, ChunkConfig};
pub use classifier::{classify, should_amplify};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use generative::GenerativeFallback;
pub use ledger::DedupLedger;
pub use market::{CoinGeckoClient, MockPriceSource, PriceSource};
pub use model::{
    Account, Category, ContentDocument, IncomingMessage, ItemId, MarketMood, NewsItem, PostHandle, PostSegment,
    PriceSnapshot, ReplyCandidate, ReplySource, SentimentReading, Term,
};
pub use news::{NewsSource, RssFeed};
pub use platform::{MockPlatform, SocialPlatform};
pub use policy::{truncate_to_ceiling, ReplyPolicy, CEILING};
pub use selector::{ReplyContext, ResponseSelector};
pub use sentiment::{LlmSentiment, SentimentAnalyzer, StubSentiment};
pub use thread::{publish_thread, ThreadOutcome};
