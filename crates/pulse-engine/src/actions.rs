//! Action Functions
//!
//! The scheduled jobs of the bot. Each action pulls from its collaborators,
//! runs the classifier / selector / policy pipeline where it applies, and
//! publishes through the [`SocialPlatform`]. [`PulseAgent::run`] is the error
//! boundary: failures are logged and recorded, never propagated to the
//! scheduler.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use agent_core::PromptParams;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::chunker::chunk;
use crate::classifier::{classify, should_amplify};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::generative::GenerativeFallback;
use crate::ledger::DedupLedger;
use crate::market::{price_line, PriceSource};
use crate::model::{
    char_len, Account, Category, ContentDocument, IncomingMessage, MarketMood, NewsItem, PostSegment, ReplySource,
    SentimentReading, Term,
};
use crate::news::{latest_news, NewsSource};
use crate::platform::SocialPlatform;
use crate::policy::truncate_to_ceiling;
use crate::prompts::{MARKET_ANALYSIS, NEWS_SUMMARY};
use crate::selector::{ReplyContext, ResponseSelector};
use crate::sentiment::SentimentAnalyzer;
use crate::terms::fallback_terms;
use crate::thread::publish_thread;

/// Trusted media accounts for the repost search
pub const MEDIA_ACCOUNTS: &[&str] = &[
    "coindesk", "cointelegraph", "decrypt", "bitcoinmagazine", "blockworks", "bingx_official",
];

/// Trusted people accounts for the repost search
pub const PEOPLE_ACCOUNTS: &[&str] = &[
    "VitalikButerin", "cz_binance", "saylor", "RaoulGMI", "lindaxie", "cobie", "peter_szilagyi", "hasufl",
    "LynAldenContact", "CryptoRand",
];

pub const MARKET_KEYWORDS: &[&str] = &["bitcoin", "ethereum", "crypto", "halving", "ETF", "defi", "market"];

/// Reposted texts must be at least this long
pub const MIN_REPOST_CHARS: usize = 30;

pub const SUMMARY_MAX_CHARS: usize = 120;
pub const HEADLINE_FALLBACK_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MarketPulse,
    AnalysisThread,
    TermOfTheDay,
    TrustedRepost,
    EngageMentions,
}

impl Action {
    pub const ALL: [Self; 5] = [
        Self::MarketPulse,
        Self::AnalysisThread,
        Self::TermOfTheDay,
        Self::TrustedRepost,
        Self::EngageMentions,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarketPulse => "market_pulse",
            Self::AnalysisThread => "analysis_thread",
            Self::TermOfTheDay => "term_of_the_day",
            Self::TrustedRepost => "trusted_repost",
            Self::EngageMentions => "engage_mentions",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one action run did
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub action: Action,

    /// Posts and replies published
    pub posted: usize,
    pub reposted: usize,
    pub liked: usize,

    /// Items passed over (seen, filtered, own posts, failed individually)
    pub skipped: usize,

    /// Batch stopped early by a rate limit or a mid-thread failure
    pub aborted: bool,

    /// Static fallback content or stub sentiment was used
    pub degraded: bool,
}

impl ActionReport {
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            posted: 0,
            reposted: 0,
            liked: 0,
            skipped: 0,
            aborted: false,
            degraded: false,
        }
    }
}

/// Last result of an action, kept for the status endpoint
#[derive(Clone, Debug, Serialize)]
pub struct ActionOutcome {
    pub action: Action,
    pub finished_at: DateTime<Utc>,
    pub report: Option<ActionReport>,
    pub error: Option<String>,
}

/// Everything the agent talks to
pub struct Collaborators {
    pub platform: Arc<dyn SocialPlatform>,
    pub generator: Arc<GenerativeFallback>,
    pub prices: Arc<dyn PriceSource>,
    pub news: Vec<Arc<dyn NewsSource>>,
    pub sentiment: Arc<dyn SentimentAnalyzer>,
    pub terms: Vec<Term>,
    pub ledger: Arc<DedupLedger>,
}

pub struct PulseAgent {
    account: Account,
    platform: Arc<dyn SocialPlatform>,
    generator: Arc<GenerativeFallback>,
    selector: ResponseSelector,
    prices: Arc<dyn PriceSource>,
    news: Vec<Arc<dyn NewsSource>>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    terms: Vec<Term>,
    ledger: Arc<DedupLedger>,
    config: EngineConfig,
    outcomes: RwLock<HashMap<Action, ActionOutcome>>,

    /// Held for the duration of a run; one action never overlaps itself
    running: HashMap<Action, tokio::sync::Mutex<()>>,
}

/// Trusted-account search query
pub fn trusted_query() -> String {
    let from = |accounts: &[&str]| {
        accounts
            .iter()
            .map(|a| format!("from:{a}"))
            .collect::<Vec<_>>()
            .join(" OR ")
    };
    format!(
        "({}) OR ({}) ({})",
        from(MEDIA_ACCOUNTS),
        from(PEOPLE_ACCOUNTS),
        MARKET_KEYWORDS.join(" OR ")
    )
}

/// Whether a search hit qualifies for a repost, ignoring the ledger
pub fn repostable(text: &str) -> bool {
    !text.contains("RT @") && char_len(text) >= MIN_REPOST_CHARS
}

/// First `HEADLINE_FALLBACK_CHARS` chars of a title, with `...` if cut
fn headline_fallback(title: &str) -> String {
    if char_len(title) > HEADLINE_FALLBACK_CHARS {
        let cut: String = title.chars().take(HEADLINE_FALLBACK_CHARS).collect();
        format!("{cut}...")
    } else {
        title.to_string()
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl PulseAgent {
    pub fn new(account: Account, deps: Collaborators, config: EngineConfig) -> Self {
        let selector = ResponseSelector::new(deps.generator.clone(), deps.prices.clone())
            .with_ceiling(config.policy.ceiling);
        let terms = if deps.terms.is_empty() { fallback_terms() } else { deps.terms };

        Self {
            account,
            platform: deps.platform,
            generator: deps.generator,
            selector,
            prices: deps.prices,
            news: deps.news,
            sentiment: deps.sentiment,
            terms,
            ledger: deps.ledger,
            config,
            outcomes: RwLock::new(HashMap::new()),
            running: Action::ALL.iter().map(|&a| (a, tokio::sync::Mutex::new(()))).collect(),
        }
    }

    pub const fn account(&self) -> &Account {
        &self.account
    }

    pub fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sentiment_degraded(&self) -> bool {
        self.sentiment.is_degraded()
    }

    pub fn generator_enabled(&self) -> bool {
        self.generator.enabled()
    }

    /// Last recorded outcome of every action that has run
    pub fn outcomes(&self) -> Vec<ActionOutcome> {
        let outcomes = self.outcomes.read().unwrap_or_else(PoisonError::into_inner);
        Action::ALL.iter().filter_map(|a| outcomes.get(a).cloned()).collect()
    }

    /// Run `action`, log the result and record it. Never fails.
    ///
    /// A second run of the same action (scheduled tick or manual trigger)
    /// waits for the one in flight to finish.
    pub async fn run<R: Rng + Send + ?Sized>(&self, action: Action, rng: &mut R) -> Option<ActionReport> {
        let _turn = match self.running.get(&action) {
            Some(turn) => Some(match turn.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::info!(action = %action, "Previous run still in flight, waiting");
                    turn.lock().await
                }
            }),
            None => None,
        };

        let started = std::time::Instant::now();
        let result = match action {
            Action::MarketPulse => self.market_pulse(rng).await,
            Action::AnalysisThread => self.analysis_thread(rng).await,
            Action::TermOfTheDay => self.term_of_the_day(rng).await,
            Action::TrustedRepost => self.trusted_repost().await,
            Action::EngageMentions => self.engage_mentions(rng).await,
        };
        let elapsed_ms = started.elapsed().as_millis();

        let (report, error) = match result {
            Ok(report) => {
                tracing::info!(
                    action = %action,
                    posted = report.posted,
                    reposted = report.reposted,
                    liked = report.liked,
                    skipped = report.skipped,
                    aborted = report.aborted,
                    degraded = report.degraded,
                    elapsed_ms,
                    "Action finished"
                );
                (Some(report), None)
            }
            Err(e) => {
                tracing::error!(action = %action, error = %e, elapsed_ms, "Action failed");
                (None, Some(e.to_string()))
            }
        };

        self.outcomes.write().unwrap_or_else(PoisonError::into_inner).insert(
            action,
            ActionOutcome {
                action,
                finished_at: Utc::now(),
                report: report.clone(),
                error,
            },
        );
        report
    }

    fn cta_line(&self) -> String {
        format!("Start trading on BingX with bonus 👉 {}", self.config.referral_link)
    }

    /// Mood of recent posts; a failed search reads as unknown
    async fn read_sentiment(&self) -> SentimentReading {
        let texts = match self
            .platform
            .search_recent(&self.config.sentiment_query, self.config.sentiment_sample)
            .await
        {
            Ok(posts) => posts.into_iter().map(|p| p.text).collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(error = %e, "Sentiment search failed");
                return SentimentReading {
                    mood: MarketMood::Unknown,
                    degraded: self.sentiment.is_degraded(),
                };
            }
        };

        let reading = self.sentiment.analyze(&texts).await;
        if reading.degraded {
            tracing::warn!(mood = ?reading.mood, "Sentiment is a random stub reading");
        }
        reading
    }

    /// One-line summary of a headline, or the shortened title
    async fn summarize(&self, news: &NewsItem) -> (String, bool) {
        let params = PromptParams::new().set("title", &news.title).set("url", &news.url);
        match self.generator.generate(&NEWS_SUMMARY, &params).await {
            Ok(summary) => (truncate_to_ceiling(&summary, SUMMARY_MAX_CHARS), false),
            Err(e) => {
                tracing::debug!(error = %e, "Summary unavailable, using headline");
                (headline_fallback(&news.title), true)
            }
        }
    }

    /// News headline, sentiment and summary in a single post
    pub async fn market_pulse<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> Result<ActionReport> {
        let news = latest_news(&self.news, rng).await;
        let sentiment = self.read_sentiment().await;
        let (summary, fallback) = self.summarize(&news).await;

        let body = format!(
            "🤖 AI Crypto Pulse\n\nMarket sentiment: {}\n📰 {summary}\n{}\n\n{}",
            sentiment.mood,
            news.url,
            self.cta_line()
        );
        let body = truncate_to_ceiling(&body, self.config.policy.ceiling);
        let handle = self.platform.post_text(&body).await?;
        tracing::debug!(handle = %handle, "Market pulse posted");

        let mut report = ActionReport::new(Action::MarketPulse);
        report.posted = 1;
        report.degraded = fallback || sentiment.degraded;
        Ok(report)
    }

    async fn analysis_document(&self, news: &NewsItem, prices: &str, mood: MarketMood) -> (ContentDocument, bool) {
        let params = PromptParams::new()
            .set("title", &news.title)
            .set("description", &news.description)
            .set("prices", prices)
            .set("mood", mood.to_string());

        let (long_body, fallback) = match self.generator.generate(&MARKET_ANALYSIS, &params).await {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::debug!(error = %e, "Analysis unavailable, using template");
                (static_analysis(news, prices, mood), true)
            }
        };

        (
            ContentDocument {
                title: news.title.clone(),
                source_url: news.url.clone(),
                long_body,
            },
            fallback,
        )
    }

    /// Long-form analysis of the latest headline, published as a thread
    pub async fn analysis_thread<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> Result<ActionReport> {
        let news = latest_news(&self.news, rng).await;
        let prices = price_line(self.prices.as_ref()).await;
        let sentiment = self.read_sentiment().await;
        let (document, fallback) = self.analysis_document(&news, &prices, sentiment.mood).await;

        let mut segments = chunk(&document, &self.config.chunk);
        let closing = format!("Source: {}\n\n{}", document.source_url, self.cta_line());
        segments.push(PostSegment {
            body: truncate_to_ceiling(&closing, self.config.chunk.ceiling),
            parent: segments.len().checked_sub(1),
        });

        let outcome = publish_thread(self.platform.as_ref(), &segments, self.config.thread_delay).await;

        let mut report = ActionReport::new(Action::AnalysisThread);
        report.posted = outcome.posted();
        report.degraded = fallback || sentiment.degraded;
        if let Some(e) = outcome.error {
            if outcome.handles.is_empty() {
                return Err(e);
            }
            report.aborted = true;
        }
        Ok(report)
    }

    /// Random glossary entry with a call to action
    pub async fn term_of_the_day<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> Result<ActionReport> {
        let term = self
            .terms
            .choose(rng)
            .ok_or_else(|| EngineError::Config("term list is empty".into()))?;

        let body = format!(
            "📚 Crypto Term of the Day:\n\n**{}** — {}\n\n{}",
            term.term,
            term.definition,
            self.cta_line()
        );
        self.platform
            .post_text(&truncate_to_ceiling(&body, self.config.policy.ceiling))
            .await?;

        let mut report = ActionReport::new(Action::TermOfTheDay);
        report.posted = 1;
        Ok(report)
    }

    /// Repost fresh market posts from trusted accounts.
    ///
    /// An id is claimed before the repost, so a failed repost is not retried.
    /// A rate limit stops the batch.
    pub async fn trusted_repost(&self) -> Result<ActionReport> {
        let hits = self
            .platform
            .search_recent(&trusted_query(), self.config.repost_limit)
            .await?;
        let mut report = ActionReport::new(Action::TrustedRepost);

        for post in hits {
            if self.ledger.seen(&post.id) || !repostable(&post.text) || !self.ledger.claim(&post.id) {
                report.skipped += 1;
                continue;
            }

            match self.platform.repost(&post.id).await {
                Ok(()) => {
                    tracing::debug!(id = %post.id, author = %post.author_handle, "Reposted");
                    report.reposted += 1;
                    pause(self.config.repost_delay).await;
                }
                Err(e) if e.aborts_batch() => {
                    tracing::warn!(id = %post.id, error = %e, "Repost batch aborted");
                    report.aborted = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(id = %post.id, error = %e, "Repost failed");
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    /// Like, maybe amplify, and reply to one mention
    async fn engage_one<R: Rng + Send + ?Sized>(
        &self,
        mention: &IncomingMessage,
        report: &mut ActionReport,
        rng: &mut R,
    ) -> Result<()> {
        self.platform.like(&mention.id).await?;
        report.liked += 1;

        if should_amplify(&mention.text) {
            self.platform.repost(&mention.id).await?;
            report.reposted += 1;
        }

        let body = self.reply_body(mention, rng).await;
        self.platform.post_reply(&body, &mention.id).await?;
        report.posted += 1;
        tracing::info!(id = %mention.id, author = mention.display_handle(), "Replied to mention");
        Ok(())
    }

    /// Classifier, selector and policy for one mention
    pub async fn reply_body<R: Rng + Send + ?Sized>(&self, mention: &IncomingMessage, rng: &mut R) -> String {
        let policy = &self.config.policy;
        let link = self.config.referral_link.as_str();
        let category = classify(&mention.text);
        let cta = policy.draw_referral(link, rng);

        let ctx = ReplyContext {
            text: &mention.text,
            username: mention.display_handle(),
            price_snapshot: None,
            cta,
        };
        let candidate = self.selector.select_reply(category, &ctx, rng).await;
        tracing::debug!(category = %category, source = ?candidate.source, "Selected reply");

        match candidate.source {
            ReplySource::Generated => truncate_to_ceiling(&candidate.body, policy.ceiling),
            ReplySource::Pool | ReplySource::Template => policy.finalize(
                &candidate.body,
                cta,
                category == Category::General,
                &mention.text,
                rng,
            ),
        }
    }

    /// Reply to new mentions, oldest first
    pub async fn engage_mentions<R: Rng + Send + ?Sized>(&self, rng: &mut R) -> Result<ActionReport> {
        let mentions = self.platform.fetch_mentions(self.config.mention_limit).await?;
        let mut report = ActionReport::new(Action::EngageMentions);

        for mention in mentions.iter().rev() {
            if mention.author_id == self.account.id || !self.ledger.claim(&mention.id) {
                report.skipped += 1;
                continue;
            }

            if let Err(e) = self.engage_one(mention, &mut report, rng).await {
                if e.aborts_batch() {
                    tracing::warn!(id = %mention.id, error = %e, "Mention batch aborted");
                    report.aborted = true;
                    break;
                }
                tracing::warn!(id = %mention.id, error = %e, "Mention engagement failed");
                report.skipped += 1;
            }

            pause(self.config.mention_delay).await;
        }

        Ok(report)
    }
}

/// Analysis body used when the generator is unavailable
fn static_analysis(news: &NewsItem, prices: &str, mood: MarketMood) -> String {
    let context = if news.description.trim().is_empty() {
        String::new()
    } else {
        format!(" {}", news.description.trim())
    };
    format!(
        "{title}.{context} Prices right now: {prices}. Crowd sentiment reads {mood}. \
Headlines like this move funding and open interest before they move spot, so watch how BTC reacts \
at the edges of its range and whether ETH follows or lags. A clean reclaim with volume is a setup; \
a wick through liquidity and back is a trap. Size small, define invalidation before entry, and let \
the market confirm the story instead of trading the headline.",
        title = news.title.trim(),
    )
}
