//! Inter-request pacing for the watch cycle.

use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Pacing state owned by the driving loop.
///
/// Carries the monotonic timestamp of the last request plus the minimum
/// interval to keep between consecutive ones. The driver passes it explicitly;
/// there is no module-level state, so the sequential driving policy is the
/// only ordering discipline required.
#[derive(Debug)]
pub struct ThrottleState {
    min_interval: Duration,
    jitter: Duration,
    last_request: Option<Instant>,
}

impl ThrottleState {
    pub fn new(min_interval: Duration, jitter: Duration) -> Self {
        Self { min_interval, jitter, last_request: None }
    }

    /// Sleeps until the minimum interval since the previous request has
    /// passed, then stamps this request. The first call returns immediately.
    pub async fn pace(&mut self) {
        if let Some(last) = self.last_request {
            let jitter_ms = self.jitter.as_millis() as u64;
            let jitter = if jitter_ms > 0 {
                Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
            } else {
                Duration::ZERO
            };

            let due = last + self.min_interval + jitter;
            let now = Instant::now();
            if due > now {
                debug!("Pacing {}ms before next request", (due - now).as_millis());
                sleep_until(due).await;
            }
        }

        self.last_request = Some(Instant::now());
    }

    /// Timestamp of the most recent paced request.
    pub fn last_request(&self) -> Option<Instant> {
        self.last_request
    }
}
