//! Retry utilities with bounded exponential backoff.
//!
//! Wraps a zero-argument async operation and re-runs it after a growing
//! delay until it succeeds or the attempt budget is spent. The final error
//! is handed back to the caller exactly as the operation produced it.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

/// Default number of attempts, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 10_000;
/// Default ceiling for any single retry delay, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 45_000;

/// Attempt budget and delay bounds for the retry executor.
///
/// `max_delay_ms` is expected to be at least `initial_delay_ms`. When it is
/// not, every retry simply waits `max_delay_ms`. The attempt budget is never
/// below one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts (including the initial one).
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum attempts. Zero is raised to one.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = if attempts == 0 { 1 } else { attempts };
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub const fn with_initial_delay_ms(mut self, delay: u64) -> Self {
        self.initial_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub const fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Initial delay as a `Duration`.
    #[must_use]
    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Delay ceiling as a `Duration`.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(backoff_delay_ms(self, attempt))
    }
}

/// Computes `min(initial * 2^(attempt - 1), max)` in whole milliseconds.
///
/// The doubling saturates to the ceiling before it can overflow, so very
/// large attempt numbers still yield `max_delay_ms`.
#[must_use]
pub fn backoff_delay_ms(policy: &RetryPolicy, attempt: u32) -> u64 {
    let exponent = attempt.saturating_sub(1);
    let scaled = 1u64
        .checked_shl(exponent)
        .and_then(|factor| policy.initial_delay_ms.checked_mul(factor))
        .unwrap_or(policy.max_delay_ms);
    scaled.min(policy.max_delay_ms)
}

/// Outcome of a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry(Duration),
    /// No more attempts left, give up.
    GiveUp,
    /// The error is not worth retrying.
    NotRetryable,
}

/// Per-invocation attempt tracking.
///
/// A fresh state is created for every executor call; nothing is shared
/// between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Current attempt number (1-based).
    pub attempt: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self { attempt: 1 }
    }
}

impl RetryState {
    /// Creates a state positioned at the first attempt.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the current attempt was the last one permitted.
    #[must_use]
    pub const fn is_exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempt >= policy.max_attempts
    }

    /// Decides what to do after the current attempt failed.
    ///
    /// On `Retry` the counter moves on to the next attempt.
    pub fn decide(&mut self, policy: &RetryPolicy) -> RetryDecision {
        self.decide_with_hint(policy, None)
    }

    /// Like [`decide`](Self::decide), but waits at least `hint` when given.
    ///
    /// The hint is still capped by `max_delay_ms`.
    pub fn decide_with_hint(
        &mut self,
        policy: &RetryPolicy,
        hint: Option<Duration>,
    ) -> RetryDecision {
        if self.is_exhausted(policy) {
            return RetryDecision::GiveUp;
        }

        let backoff = policy.delay_for_attempt(self.attempt);
        let delay = hint.map_or(backoff, |hint| backoff.max(hint.min(policy.max_delay())));
        self.attempt += 1;
        RetryDecision::Retry(delay)
    }
}

/// Executes an operation, retrying every failure until the budget runs out.
///
/// The error of the final attempt is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    key: &str,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    with_retry_if(policy, key, operation, |_| true).await
}

/// Executes an operation with retry logic, consulting `should_retry` first.
///
/// Errors rejected by `should_retry` are returned immediately without any
/// delay, regardless of the remaining budget.
pub async fn with_retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    key: &str,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    with_retry_hinted(policy, key, operation, should_retry, |_| None).await
}

/// Like [`with_retry_if`], but `delay_hint` can raise the next delay.
///
/// Used for errors that carry a server-requested wait, such as a
/// `Retry-After` header.
pub async fn with_retry_hinted<T, E, F, Fut, P, H>(
    policy: &RetryPolicy,
    key: &str,
    mut operation: F,
    should_retry: P,
    delay_hint: H,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    H: Fn(&E) -> Option<Duration>,
{
    let mut state = RetryState::new();

    loop {
        let err = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let decision = if should_retry(&err) {
            state.decide_with_hint(policy, delay_hint(&err))
        } else {
            RetryDecision::NotRetryable
        };

        match decision {
            RetryDecision::Retry(delay) => {
                let failed = state.attempt - 1;
                warn!(
                    key = %key,
                    attempt = failed,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "Attempt {} failed. Retrying in {}s ({}/{})",
                    failed,
                    delay.as_secs_f64(),
                    state.attempt,
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
            }
            RetryDecision::GiveUp => {
                error!(key = %key, attempts = state.attempt, error = %err, "Retries exhausted");
                return Err(err);
            }
            RetryDecision::NotRetryable => {
                error!(key = %key, attempt = state.attempt, error = %err, "Non-retryable error");
                return Err(err);
            }
        }
    }
}
