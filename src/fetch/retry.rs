//! Retry Executor
//!
//! Runs a remote attempt up to a fixed number of times. Each attempt reports an
//! explicit [`AttemptError`] so the loop never has to inspect error types to
//! decide whether to try again.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ImagingError, Result};

/// Total attempts per lookup (one initial try plus two retries).
pub const MAX_ATTEMPTS: u32 = 3;

// == Attempt Error ==
/// Outcome of a single failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError {
    /// The call did not complete; worth trying again
    Transient(String),
    /// The remote answered and the answer is final
    Permanent(ImagingError),
}

// == Retry Policy ==
/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Growth factor applied to each following delay
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    /// 3 attempts, waiting 50 ms then 150 ms between them.
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: Duration::from_millis(50),
            multiplier: 3,
        }
    }
}

impl RetryPolicy {
    /// 3 attempts with no delay in between.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

// == Retry Executor ==
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    // == Execute ==
    /// Runs `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// `operation` receives the 1-based attempt number. Exhaustion yields
    /// [`ImagingError::Network`] carrying the last transient reason.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Permanent(err)) => return Err(err),
                Err(AttemptError::Transient(reason)) => {
                    if attempt < max_attempts {
                        let delay = self.policy.delay_after(attempt);
                        warn!(
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            %reason,
                            "transient fetch failure, retrying"
                        );
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    last_reason = reason;
                }
            }
        }

        Err(ImagingError::Network {
            attempts: max_attempts,
            reason: last_reason,
        })
    }
}
