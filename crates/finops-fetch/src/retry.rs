//! Fixed-delay retry with shutdown-aware sleeps.

use std::time::Duration;

use tokio::sync::watch;

use crate::error::{FetchError, FetchResult};

/// Delay between failed attempts. Retries are unlimited.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Wait out the retry delay.
    pub async fn backoff(&self, shutdown: &mut watch::Receiver<bool>) -> FetchResult<()> {
        pause(self.delay, shutdown).await
    }
}

/// Sleep for `duration` unless shutdown is signalled first, in which case
/// [`FetchError::Cancelled`] is returned. A dropped sender counts as
/// shutdown.
pub async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> FetchResult<()> {
    if *shutdown.borrow() {
        return Err(FetchError::Cancelled);
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = shutdown.wait_for(|stop| *stop) => Err(FetchError::Cancelled),
    }
}
