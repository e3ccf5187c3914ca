//! Threading Assembler
//!
//! Publishes chunked segments as a reply chain: segment 0 as a new post, each
//! later segment as a reply to the handle of the one before it.

use std::time::Duration;

use crate::error::EngineError;
use crate::model::{PostHandle, PostSegment};
use crate::platform::SocialPlatform;

pub const DEFAULT_THREAD_DELAY: Duration = Duration::from_secs(2);

/// How far a thread got
#[derive(Debug)]
pub struct ThreadOutcome {
    /// Handles of the posted segments, in order
    pub handles: Vec<PostHandle>,

    pub total: usize,

    /// Error that stopped the chain, if any
    pub error: Option<EngineError>,
}

impl ThreadOutcome {
    pub fn posted(&self) -> usize {
        self.handles.len()
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.posted() == self.total
    }
}

/// Post `segments` in order, sleeping `delay` between posts.
///
/// The first failure aborts the rest of the chain; segments already posted
/// stay up.
pub async fn publish_thread(
    platform: &dyn SocialPlatform,
    segments: &[PostSegment],
    delay: Duration,
) -> ThreadOutcome {
    let mut handles: Vec<PostHandle> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = match segment.parent.and_then(|p| handles.get(p)) {
            Some(parent) => platform.post_reply(&segment.body, parent).await,
            None => platform.post_text(&segment.body).await,
        };

        match result {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                tracing::warn!(segment = i, posted = handles.len(), error = %e, "Thread aborted");
                return ThreadOutcome {
                    handles,
                    total: segments.len(),
                    error: Some(e),
                };
            }
        }
    }

    tracing::info!(segments = handles.len(), "Thread published");
    ThreadOutcome {
        handles,
        total: segments.len(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, ItemId};
    use crate::platform::{Failure, MockPlatform, PlatformCall};

    fn platform() -> MockPlatform {
        MockPlatform::new(Account {
            id: ItemId::from("1"),
            handle: "bot".into(),
        })
    }

    fn segments(n: usize) -> Vec<PostSegment> {
        (0..n)
            .map(|i| PostSegment {
                body: format!("part {i}"),
                parent: i.checked_sub(1),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_chain() {
        let platform = platform();
        let outcome = publish_thread(&platform, &segments(4), DEFAULT_THREAD_DELAY).await;

        assert!(outcome.is_complete());
        let calls = platform.calls();
        assert!(matches!(&calls[0], PlatformCall::PostText { body, .. } if body == "part 0"));
        assert_eq!(calls.len(), 4);
        for (i, call) in calls.iter().enumerate().skip(1) {
            match call {
                PlatformCall::PostReply { body, parent, .. } => {
                    assert_eq!(body, &format!("part {i}"));
                    assert_eq!(parent, &outcome.handles[i - 1]);
                }
                other => panic!("unexpected call {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_posts() {
        let start = tokio::time::Instant::now();
        publish_thread(&platform(), &segments(3), Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_aborts_remainder() {
        let platform = platform().fail_posts_after(2, Failure::RateLimited);
        let outcome = publish_thread(&platform, &segments(4), DEFAULT_THREAD_DELAY).await;

        assert_eq!(outcome.posted(), 2);
        assert_eq!(outcome.total, 4);
        assert!(!outcome.is_complete());
        assert!(outcome.error.unwrap().aborts_batch());
        assert_eq!(platform.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_thread() {
        let outcome = publish_thread(&platform(), &[], Duration::ZERO).await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.posted(), 0);
    }
}
