// Feed discovery and sample reading
//
// `FeedResolver` issues one discovery query for a published feed matching
// a type tag; `resolve_with_retry` wraps it in the bounded retry/backoff
// policy used both for the initial connection and for reconnection after
// feed loss. `SampleFeed` is the handle the streaming loop pulls from;
// implementations classify broken connections as `FeedLost` so the
// orchestrator can re-resolve.

#[cfg(feature = "lsl-support")]
mod lsl;

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::RetryBudget;
use crate::types::{FeedLost, ResolveError, Sample};

#[cfg(feature = "lsl-support")]
pub use lsl::LslResolver;

/// Handle to a resolved data feed, exclusively owned by one session's
/// streaming loop until replaced on reconnect or discarded at session end.
#[async_trait]
pub trait SampleFeed: Send {
    /// Pull the next sample, waiting at most `timeout`.
    ///
    /// `Ok(None)` means nothing arrived in time and the caller should
    /// re-poll; `Err(FeedLost)` means the underlying connection is broken.
    async fn pull(&mut self, timeout: Duration) -> Result<Option<Sample>, FeedLost>;
}

/// Discovery of published data feeds by type tag.
#[async_trait]
pub trait FeedResolver: Send + Sync {
    /// Issue one discovery query; `Ok(None)` when no feed matched in time.
    async fn resolve(
        &self,
        stream_type: &str,
        timeout: Duration,
    ) -> Result<Option<Box<dyn SampleFeed>>, ResolveError>;
}

/// Resolve a feed within a bounded retry budget.
///
/// The first attempt uses `budget.first_timeout`; each of the up to
/// `budget.max_retries` further attempts uses the shortened
/// `budget.retry_timeout`, with a fixed `budget.backoff` sleep before it.
/// At most `max_retries + 1` attempts are issued before giving up with
/// [`ResolveError::NoFeedFound`].
pub async fn resolve_with_retry(
    resolver: &dyn FeedResolver,
    stream_type: &str,
    budget: &RetryBudget,
) -> Result<Box<dyn SampleFeed>, ResolveError> {
    let total = budget.max_retries + 1;

    for attempt in 1..=total {
        let timeout = if attempt == 1 {
            budget.first_timeout
        } else {
            info!(
                "no {} feed available, retrying (attempt {}/{})",
                stream_type, attempt, total
            );
            tokio::time::sleep(budget.backoff).await;
            budget.retry_timeout
        };

        if let Some(feed) = resolver.resolve(stream_type, timeout).await? {
            return Ok(feed);
        }
    }

    Err(ResolveError::NoFeedFound { attempts: total })
}
