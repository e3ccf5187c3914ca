//! News Sources
//!
//! Headline sources for the market pulse post and the analysis thread.
//! Sources are polled in random order and the first one with an entry wins.

mod mock;
mod rss;

pub use mock::MockNewsSource;
pub use rss::{RssFeed, RSS_FEEDS};

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{EngineError, Result};
use crate::model::NewsItem;

/// Headline used when every source comes back empty
pub const FALLBACK_TITLE: &str = "Stay updated";
pub const FALLBACK_URL: &str = "https://cointelegraph.com";

/// News source trait (Strategy pattern)
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Newest entry, or `None` if the source has nothing to offer
    async fn fetch_latest(&self) -> Result<Option<NewsItem>>;

    fn name(&self) -> &str;
}

/// Poll `sources` in shuffled order and return the first entry found.
///
/// Source errors are logged and skipped. Fails with
/// [`EngineError::NoContentAvailable`] when nothing produced an entry.
pub async fn try_latest_news<R: Rng + Send + ?Sized>(
    sources: &[Arc<dyn NewsSource>],
    rng: &mut R,
) -> Result<NewsItem> {
    let mut order: Vec<&Arc<dyn NewsSource>> = sources.iter().collect();
    order.shuffle(rng);

    for source in order {
        match source.fetch_latest().await {
            Ok(Some(item)) => {
                tracing::debug!(source = source.name(), title = %item.title, "Fetched headline");
                return Ok(item);
            }
            Ok(None) => tracing::debug!(source = source.name(), "Source had no entries"),
            Err(e) => tracing::warn!(source = source.name(), error = %e, "News fetch failed"),
        }
    }

    Err(EngineError::NoContentAvailable(sources.len()))
}

/// Like [`try_latest_news`] but never fails: falls back to a generic headline.
pub async fn latest_news<R: Rng + Send + ?Sized>(sources: &[Arc<dyn NewsSource>], rng: &mut R) -> NewsItem {
    match try_latest_news(sources, rng).await {
        Ok(item) => item,
        Err(e) => {
            tracing::info!(error = %e, "Using fallback headline");
            fallback_news()
        }
    }
}

pub fn fallback_news() -> NewsItem {
    NewsItem {
        title: FALLBACK_TITLE.to_string(),
        url: FALLBACK_URL.to_string(),
        description: String::new(),
    }
}
