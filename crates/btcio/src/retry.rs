use std::{future::Future, time::Duration};

use babylon_config::RetryConfig;
use tracing::*;

use crate::source::FetchError;

/// Capped exponential backoff for fetches against an unreliable source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Multiplier for each subsequent retry.
    pub multiplier: f64,

    /// Maximum delay cap.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            multiplier: config.multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Calculate the delay before retry number `retry_count` (zero based).
    pub fn calculate_delay(&self, retry_count: u32) -> Duration {
        if retry_count == 0 {
            return self.base_delay.min(self.max_delay);
        }

        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(delay.min(self.max_delay.as_millis() as f64) as u64)
    }

    pub fn should_retry(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: *self,
            retries: 0,
        }
    }

    /// Runs `op` until it succeeds, fails fatally or exhausts the retry budget.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut backoff = self.backoff();
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(err) if err.is_transient() => match backoff.next_delay() {
                    Some(delay) => {
                        warn!(%what, %err, retry = backoff.retries(), ?delay, "retrying fetch");
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        warn!(%what, %err, retries = backoff.retries(), "giving up on fetch");
                        return Err(err);
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }
}

/// Retry state for a single operation.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    retries: u32,
}

impl Backoff {
    /// Retries consumed so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Delay before the next retry, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.policy.should_retry(self.retries) {
            return None;
        }
        let delay = self.policy.calculate_delay(self.retries);
        self.retries += 1;
        Some(delay)
    }
}
