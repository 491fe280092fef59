//! ============================================================================
//! Retry Logic - Bounded exponential backoff for completion requests
//! ============================================================================
//! Only transient failures (rate limits, transport, timeouts, 5xx) are
//! retried. Delays double per attempt and are capped.
//! ============================================================================

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::CompletionError;

/// Configuration for completion retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    /// Base delay between retries (multiplied by 2^attempt)
    pub base_delay_ms: u64,
    /// Maximum delay between retries
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::with_max_retries(0)
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt.min(63));
        let delay = self.base_delay_ms.saturating_mul(multiplier);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, CompletionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CompletionError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = match &e {
                        CompletionError::RateLimited(_) => Duration::from_millis(self.max_delay_ms),
                        _ => self.delay_for(attempt),
                    };
                    warn!(
                        "Completion attempt {} failed ({}), retrying in {:?}",
                        attempt + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!("Completion failed after {} attempt(s): {}", attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }
}
