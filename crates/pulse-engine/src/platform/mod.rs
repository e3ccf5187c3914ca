//! Social Platform Seam
//!
//! Everything the engine needs from the social network. Implementations map
//! HTTP 429 (or equivalent) to [`EngineError::RateLimited`] and every other
//! failure to [`EngineError::Transport`].
//!
//! [`EngineError::RateLimited`]: crate::error::EngineError::RateLimited
//! [`EngineError::Transport`]: crate::error::EngineError::Transport

mod mock;

pub use mock::{Failure, MockPlatform, PlatformCall};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Account, IncomingMessage, ItemId, PostHandle};

#[async_trait]
pub trait SocialPlatform: Send + Sync {
    /// The authenticated account
    async fn me(&self) -> Result<Account>;

    async fn post_text(&self, body: &str) -> Result<PostHandle>;

    async fn post_reply(&self, body: &str, parent: &PostHandle) -> Result<PostHandle>;

    async fn repost(&self, id: &ItemId) -> Result<()>;

    async fn like(&self, id: &ItemId) -> Result<()>;

    /// Recent mentions of the authenticated account, newest first
    async fn fetch_mentions(&self, limit: usize) -> Result<Vec<IncomingMessage>>;

    /// Recent posts matching a search query, newest first
    async fn search_recent(&self, query: &str, limit: usize) -> Result<Vec<IncomingMessage>>;

    fn name(&self) -> &str;
}
