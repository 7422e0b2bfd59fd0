//! Retry policy with exponential backoff
//!
//! The core never retries on its own: the default policy makes zero
//! extra attempts. Callers who want resilience against a flaky provider
//! opt in through configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::errors::{RagError, Result};

/// Configurable retry-with-backoff policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure (0 = never retry)
    pub max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds
    pub base_delay_ms: u64,
    /// Delay cap in milliseconds
    pub max_delay_ms: u64,
    /// Add +/-25% random variation to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 1000,
            max_delay_ms: 16000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Execute `operation`, retrying transient failures up to the
    /// configured number of extra attempts
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !is_retryable(&e) || attempt >= self.max_retries {
                        return Err(e);
                    }

                    attempt += 1;
                    sleep(self.delay_for(attempt)).await;
                }
            }
        }
    }

    /// Delay for the given attempt number (1-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let delay_ms = exponential.min(self.max_delay_ms);

        let final_ms = if self.jitter {
            let jitter = (delay_ms / 4) as i64;
            let random_jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter as f64;
            ((delay_ms as i64) + random_jitter as i64).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(final_ms)
    }
}

/// Only provider-side failures are worth retrying; data-absence errors
/// (empty index, nothing above threshold) never are
fn is_retryable(error: &RagError) -> bool {
    matches!(
        error,
        RagError::Synthesis(_) | RagError::Embedding(_) | RagError::Timeout { .. } | RagError::Http(_)
    )
}
