//! Bounded retry with exponential backoff.
//!
//! Retry is an explicit loop with a classification check and an attempt
//! counter, not exception-driven control flow. Cancellation is a checked
//! condition inside the loop: before each backoff wait the policy compares
//! against the run deadline and gives up rather than sleeping past it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

use crate::error::{ErrorClass, ScmError, ScmResult};

/// Retry policy for network-bound source-control operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
    /// Upper bound on any single backoff wait, including Retry-After.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Backoff before the attempt following `attempt` (1-based).
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Run `operation` with bounded retries.
    ///
    /// Permanent failures surface immediately. Transient failures are
    /// retried up to `max_attempts` with exponential backoff; a rate-limit
    /// Retry-After hint overrides the computed backoff (capped at
    /// `max_delay`). Exhausting attempts yields exactly one
    /// `RetriesExhausted` error wrapping the last failure.
    pub async fn run<T, F, Fut>(
        &self,
        op: &str,
        deadline: Option<Instant>,
        mut operation: F,
    ) -> ScmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ScmResult<T>>,
    {
        let mut attempt = 1u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if e.class() == ErrorClass::Permanent {
                        return Err(e);
                    }
                    if attempt >= self.max_attempts {
                        return Err(ScmError::RetriesExhausted {
                            op: op.to_string(),
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }

                    let delay = match &e {
                        ScmError::RateLimited { retry_after: Some(hint) } => {
                            (*hint).min(self.max_delay)
                        }
                        _ => self.backoff_delay(attempt),
                    };

                    if let Some(deadline) = deadline {
                        if Instant::now() + delay >= deadline {
                            return Err(ScmError::DeadlineExceeded(op.to_string()));
                        }
                    }

                    warn!(
                        "{} attempt {}/{} failed ({}), retrying in {:?}",
                        op, attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
