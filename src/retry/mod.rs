//! Bounded immediate retry for transient store failures.

use std::future::Future;

use tracing::warn;

use crate::error::StoreError;

/// Re-executes an operation when it fails with a transient connection
/// error, up to a fixed number of total attempts. Retries are immediate and
/// consecutive: no backoff, no jitter. Non-transient failures propagate
/// after the first attempt, and the last transient failure is returned
/// unchanged once the budget is spent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    /// The standard budget: one initial attempt plus two retries.
    pub fn new() -> Self {
        RetryPolicy { max_attempts: 3 }
    }

    /// A policy with a custom total-attempt budget (minimum 1).
    pub fn attempts(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Run `op`, retrying transient failures.
    pub fn execute<R, F>(&self, mut op: F) -> Result<R, StoreError>
    where
        F: FnMut() -> Result<R, StoreError>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(attempts = attempt, "transient failure budget exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Async twin of [`execute`](Self::execute) with identical attempt
    /// counting. The retried call is awaited at a suspension point; no
    /// worker thread blocks while a round trip is outstanding.
    pub async fn execute_async<R, F, Fut>(&self, mut op: F) -> Result<R, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, StoreError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(attempts = attempt, "transient failure budget exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }
}
