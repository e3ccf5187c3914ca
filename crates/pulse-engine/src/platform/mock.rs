//! Mock Platform
//!
//! In-memory recorder used by tests and by the bot's dry-run mode. Posts get
//! random UUID handles; failures can be scripted per operation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::SocialPlatform;
use crate::error::{EngineError, Result};
use crate::model::{Account, IncomingMessage, ItemId, PostHandle};

/// A call the platform received
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformCall {
    PostText { body: String, handle: PostHandle },
    PostReply { body: String, parent: PostHandle, handle: PostHandle },
    Repost(ItemId),
    Like(ItemId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    RateLimited,
    Transport,
}

impl Failure {
    fn into_error(self, op: &str) -> EngineError {
        match self {
            Self::RateLimited => EngineError::RateLimited(format!("mock {op}")),
            Self::Transport => EngineError::Transport(format!("mock {op} failed")),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct MockPlatform {
    account: Account,
    identity_failure: Option<Failure>,
    mentions: Vec<IncomingMessage>,
    search_results: Vec<IncomingMessage>,

    /// Posts allowed to succeed before every further post fails
    post_budget: Option<(usize, Failure)>,
    reply_failures: HashMap<ItemId, Failure>,
    repost_failures: HashMap<ItemId, Failure>,

    calls: Mutex<Vec<PlatformCall>>,
    queries: Mutex<Vec<String>>,

    /// Dry-run mode: log instead of record, so memory stays flat
    log_posts: bool,
}

impl MockPlatform {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            identity_failure: None,
            mentions: Vec::new(),
            search_results: Vec::new(),
            post_budget: None,
            reply_failures: HashMap::new(),
            repost_failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            log_posts: false,
        }
    }

    /// Logs every post at info level and keeps no call history
    pub fn dry_run(account: Account) -> Self {
        Self {
            log_posts: true,
            ..Self::new(account)
        }
    }

    /// Mentions returned by `fetch_mentions`, newest first
    pub fn with_mentions(mut self, mentions: Vec<IncomingMessage>) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn with_search_results(mut self, results: Vec<IncomingMessage>) -> Self {
        self.search_results = results;
        self
    }

    pub fn fail_identity(mut self, failure: Failure) -> Self {
        self.identity_failure = Some(failure);
        self
    }

    /// Let `allowed` posts (text or reply) through, then fail every post
    pub fn fail_posts_after(mut self, allowed: usize, failure: Failure) -> Self {
        self.post_budget = Some((allowed, failure));
        self
    }

    /// Fail replies addressed to `parent`
    pub fn fail_reply_to(mut self, parent: &str, failure: Failure) -> Self {
        self.reply_failures.insert(ItemId::from(parent), failure);
        self
    }

    pub fn fail_repost_of(mut self, id: &str, failure: Failure) -> Self {
        self.repost_failures.insert(ItemId::from(id), failure);
        self
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        lock(&self.calls).clone()
    }

    /// Bodies of every successful post and reply, in order
    pub fn posts(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                PlatformCall::PostText { body, .. } | PlatformCall::PostReply { body, .. } => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn replies_to(&self, parent: &str) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                PlatformCall::PostReply { body, parent: p, .. } if p.as_str() == parent => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn reposts(&self) -> Vec<ItemId> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Repost(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn likes(&self) -> Vec<ItemId> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                PlatformCall::Like(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }

    fn post_count(calls: &[PlatformCall]) -> usize {
        calls
            .iter()
            .filter(|c| matches!(c, PlatformCall::PostText { .. } | PlatformCall::PostReply { .. }))
            .count()
    }

    fn record(&self, calls: &mut Vec<PlatformCall>, call: PlatformCall) {
        if !self.log_posts {
            calls.push(call);
        }
    }

    fn check_post_budget(&self, calls: &[PlatformCall]) -> Result<()> {
        match self.post_budget {
            Some((allowed, failure)) if Self::post_count(calls) >= allowed => Err(failure.into_error("post")),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SocialPlatform for MockPlatform {
    async fn me(&self) -> Result<Account> {
        match self.identity_failure {
            Some(failure) => Err(failure.into_error("me")),
            None => Ok(self.account.clone()),
        }
    }

    async fn post_text(&self, body: &str) -> Result<PostHandle> {
        let mut calls = lock(&self.calls);
        self.check_post_budget(&calls)?;

        let handle = PostHandle::new(uuid::Uuid::new_v4().to_string());
        if self.log_posts {
            tracing::info!(handle = %handle, chars = body.chars().count(), "[dry-run] post\n{body}");
        }
        self.record(
            &mut calls,
            PlatformCall::PostText {
                body: body.to_string(),
                handle: handle.clone(),
            },
        );
        Ok(handle)
    }

    async fn post_reply(&self, body: &str, parent: &PostHandle) -> Result<PostHandle> {
        if let Some(failure) = self.reply_failures.get(parent) {
            return Err(failure.into_error("reply"));
        }
        let mut calls = lock(&self.calls);
        self.check_post_budget(&calls)?;

        let handle = PostHandle::new(uuid::Uuid::new_v4().to_string());
        if self.log_posts {
            tracing::info!(handle = %handle, parent = %parent, "[dry-run] reply\n{body}");
        }
        self.record(
            &mut calls,
            PlatformCall::PostReply {
                body: body.to_string(),
                parent: parent.clone(),
                handle: handle.clone(),
            },
        );
        Ok(handle)
    }

    async fn repost(&self, id: &ItemId) -> Result<()> {
        if let Some(failure) = self.repost_failures.get(id) {
            return Err(failure.into_error("repost"));
        }
        if self.log_posts {
            tracing::info!(id = %id, "[dry-run] repost");
        }
        self.record(&mut lock(&self.calls), PlatformCall::Repost(id.clone()));
        Ok(())
    }

    async fn like(&self, id: &ItemId) -> Result<()> {
        if self.log_posts {
            tracing::info!(id = %id, "[dry-run] like");
        }
        self.record(&mut lock(&self.calls), PlatformCall::Like(id.clone()));
        Ok(())
    }

    async fn fetch_mentions(&self, limit: usize) -> Result<Vec<IncomingMessage>> {
        Ok(self.mentions.iter().take(limit).cloned().collect())
    }

    async fn search_recent(&self, query: &str, limit: usize) -> Result<Vec<IncomingMessage>> {
        if !self.log_posts {
            lock(&self.queries).push(query.to_string());
        }
        Ok(self.search_results.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: ItemId::from("1000"),
            handle: "pulse_bot".into(),
        }
    }

    #[tokio::test]
    async fn test_records_posts_and_replies() {
        let platform = MockPlatform::new(account());
        let root = platform.post_text("gm").await.unwrap();
        let reply = platform.post_reply("part two", &root).await.unwrap();

        assert_ne!(root, reply);
        assert_eq!(platform.posts(), vec!["gm", "part two"]);
        assert_eq!(platform.replies_to(root.as_str()), vec!["part two"]);
    }

    #[tokio::test]
    async fn test_post_budget() {
        let platform = MockPlatform::new(account()).fail_posts_after(1, Failure::RateLimited);
        platform.post_text("one").await.unwrap();
        let err = platform.post_text("two").await.unwrap_err();
        assert!(err.aborts_batch());
        assert_eq!(platform.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_identity_failure() {
        let platform = MockPlatform::new(account()).fail_identity(Failure::Transport);
        assert!(matches!(platform.me().await, Err(EngineError::Transport(_))));
    }

    #[tokio::test]
    async fn test_fetch_limits() {
        let mentions = (0..5).map(|i| IncomingMessage::new(i.to_string(), "u", "9", "gm")).collect();
        let platform = MockPlatform::new(account()).with_mentions(mentions);
        assert_eq!(platform.fetch_mentions(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_dry_run_keeps_no_history() {
        let platform = MockPlatform::dry_run(account());
        for i in 0..50 {
            let root = platform.post_text(&format!("pulse {i}")).await.unwrap();
            platform.post_reply("more", &root).await.unwrap();
            platform.like(&ItemId::from("m1")).await.unwrap();
            platform.search_recent("#bitcoin", 10).await.unwrap();
        }
        assert!(platform.calls().is_empty());
        assert!(platform.queries().is_empty());
    }
}
