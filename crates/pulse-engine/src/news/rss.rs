//! RSS / Atom feed adapter

use std::time::Duration;

use async_trait::async_trait;
use scraper::Html;

use super::{NewsSource, FALLBACK_URL};
use crate::error::{EngineError, Result};
use crate::model::NewsItem;
use crate::policy::truncate_to_ceiling;

/// Default crypto news feeds
pub const RSS_FEEDS: &[&str] = &[
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
    "https://cointelegraph.com/rss",
    "https://decrypt.co/feed",
    "https://cryptobriefing.com/feed/",
    "https://news.bitcoin.com/feed/",
    "https://bitcoinmagazine.com/.rss/full/",
    "https://beincrypto.com/feed/",
    "https://thedefiant.io/rss/",
    "https://blockworks.co/news/feed/",
    "https://glassnode.com/feed.xml",
    "https://santiment.net/blog/feed/",
    "https://ethereum.org/en/rss/blog.xml",
    "https://blog.chain.link/rss.xml",
    "https://polygon.technology/blog/rss.xml",
    "https://nftnow.com/feed/",
    "https://nftevening.com/feed/",
    "https://www.coindesk.com/policy/feed/",
];

const DEFAULT_TITLE: &str = "Market update";

/// Longest description kept from a feed entry, in chars
pub const DESCRIPTION_MAX_CHARS: usize = 300;

pub struct RssFeed {
    http: reqwest::Client,
    url: String,
}

impl RssFeed {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    /// One adapter per entry of [`RSS_FEEDS`], sharing a client
    pub fn defaults(timeout: Duration) -> Result<Vec<Self>> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("CryptoPulseBot/1.0")
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(RSS_FEEDS.iter().map(|url| Self::new(http.clone(), *url)).collect())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Readable text of an HTML fragment: tags dropped, entities decoded,
/// whitespace collapsed
fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First entry of a parsed feed document, if any
fn first_entry(bytes: &[u8]) -> Result<Option<NewsItem>> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| EngineError::Transport(format!("unparseable feed: {e}")))?;

    Ok(feed.entries.into_iter().next().map(|entry| {
        let title = entry
            .title
            .map(|t| plain_text(&t.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let url = entry
            .links
            .into_iter()
            .next()
            .map_or_else(|| FALLBACK_URL.to_string(), |link| link.href);
        let description = entry
            .summary
            .map(|s| truncate_to_ceiling(&plain_text(&s.content), DESCRIPTION_MAX_CHARS))
            .unwrap_or_default();
        NewsItem { title, url, description }
    }))
}

#[async_trait]
impl NewsSource for RssFeed {
    async fn fetch_latest(&self) -> Result<Option<NewsItem>> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::Transport(format!("{} returned {}", self.url, response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| EngineError::Transport(e.to_string()))?;
        first_entry(&bytes)
    }

    fn name(&self) -> &str {
        &self.url
    }
}
