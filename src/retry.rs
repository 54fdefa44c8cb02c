//! Bounded retry with exponential backoff and identity rotation.

use crate::error::ScrapeError;
use crate::identity::{Identity, IdentityPool};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, warn};

/// How persistently to retry transient transport failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the initial attempt; `max_retries + 1` total tries.
    pub max_retries: u32,
    /// Backoff base; the wait after failed attempt `n` (0-based) is
    /// `base_delay * 2^n` plus random jitter up to half the base.
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn backoff_delay(&self, failed_attempt: u32) -> Duration {
        let factor = 1u32 << failed_attempt.min(16);
        let backoff = self.base_delay.saturating_mul(factor);

        let jitter_cap = self.base_delay.as_millis() as u64 / 2;
        let jitter = if jitter_cap > 0 { rand::rng().random_range(0..=jitter_cap) } else { 0 };

        backoff + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(1000) }
    }
}

/// Runs `op` until it succeeds, retrying transient failures with a fresh
/// identity per attempt.
///
/// Non-transient errors pass through on first occurrence. When the attempt
/// budget runs out the terminal attempt's error is wrapped in
/// [`ScrapeError::RetryExhausted`]; earlier errors are logged with their
/// attempt index, not discarded.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    identities: &IdentityPool,
    mut op: F,
) -> Result<T, ScrapeError>
where
    F: FnMut(Identity, u32) -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut attempt: u32 = 0;

    loop {
        let identity = identities.generate();

        match op(identity, attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt < policy.max_retries => {
                let delay = policy.backoff_delay(attempt);
                warn!(
                    "Attempt {} failed: {}. Retrying in {}ms",
                    attempt + 1,
                    err,
                    delay.as_millis()
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!("All {} attempts failed: {}", attempt + 1, err);
                return Err(ScrapeError::RetryExhausted {
                    attempts: attempt + 1,
                    source: Box::new(err),
                });
            }
        }
    }
}
