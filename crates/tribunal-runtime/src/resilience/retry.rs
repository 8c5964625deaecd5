//! Rate-limit retry with exponential backoff.
//!
//! Only [`ProviderError::RateLimited`] is retried. With the defaults an
//! operation runs at most three times, waiting 5s and then 15s between
//! attempts; no single wait exceeds 30s.

use backon::{BackoffBuilder, ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::config::duration_human;
use crate::providers::ProviderError;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: usize,

    /// Wait before the second attempt
    #[serde(with = "duration_human")]
    pub initial_delay: Duration,

    /// Growth factor between consecutive waits
    pub factor: f32,

    /// Upper bound on any single wait
    #[serde(with = "duration_human")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
            factor: 3.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_factor(self.factor)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }

    /// The waits this policy would apply, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.backoff().build().collect()
    }

    /// Run `operation`, retrying while it fails with a rate limit.
    ///
    /// The error of the final attempt is returned once attempts run out.
    pub async fn run<T, F, Fut>(&self, provider: &str, operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        operation
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(ProviderError::is_rate_limited)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::warn!(
                    provider = provider,
                    delay = ?delay,
                    error = %err,
                    "Rate limited, backing off"
                );
            })
            .await
    }
}
