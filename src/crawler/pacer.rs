//! Fixed-delay request pacing
//!
//! Listing pages are fetched one at a time. After a page has been fetched
//! and its products persisted, the next request waits out a fixed delay.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Enforces a pause between the end of one request and the start of the next
#[derive(Debug)]
pub struct RequestPacer {
    delay: Duration,
    last_finished: Option<Instant>,
}

impl RequestPacer {
    /// Creates a pacer; the first request is never delayed
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_finished: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until the delay since the last finished request has elapsed
    pub async fn wait_turn(&self) {
        if let Some(last) = self.last_finished {
            let ready_at = last + self.delay;
            if ready_at > Instant::now() {
                tracing::trace!("Pacing next request by {:?}", ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }
    }

    /// Records that the current request and its processing are done
    pub fn finish(&mut self) {
        self.last_finished = Some(Instant::now());
    }
}
