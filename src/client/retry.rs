//! Bounded fixed-delay retry

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn with_retries(self, retries: u32) -> Self {
        Self { retries, ..self }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or `retries + 1` attempts have been made. Attempts are sequential.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(label, attempt, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    if attempt > self.retries {
                        warn!(label, attempt, error = %err, "Request failed after retries");
                        return Err(err);
                    }

                    warn!(label, attempt, error = %err, "Request failed, retrying");
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
