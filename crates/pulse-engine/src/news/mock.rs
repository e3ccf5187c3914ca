//! Mock News Source

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::NewsSource;
use crate::error::{EngineError, Result};
use crate::model::NewsItem;

enum Behavior {
    Item(NewsItem),
    Empty,
    Failing,
}

pub struct MockNewsSource {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockNewsSource {
    pub fn with_item(title: &str, url: &str) -> Self {
        Self::from_item(NewsItem {
            title: title.to_string(),
            url: url.to_string(),
            description: String::new(),
        })
    }

    pub fn from_item(item: NewsItem) -> Self {
        Self::new(Behavior::Item(item))
    }

    /// Feed reachable but without entries
    pub fn empty() -> Self {
        Self::new(Behavior::Empty)
    }

    /// Every fetch fails with a transport error
    pub fn failing() -> Self {
        Self::new(Behavior::Failing)
    }

    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    async fn fetch_latest(&self) -> Result<Option<NewsItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Item(item) => Ok(Some(item.clone())),
            Behavior::Empty => Ok(None),
            Behavior::Failing => Err(EngineError::Transport("mock feed offline".into())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
