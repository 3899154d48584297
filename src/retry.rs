//! Retry logic with exponential backoff
//!
//! A single explicit policy ([`RetryConfig`]) applied by the caller around
//! the one fetch operation that can transiently fail. Transient faults are
//! classified by the [`IsRetryable`] trait; when the budget runs out the
//! last fault is wrapped in [`Error::RetriesExhausted`] so callers can tell
//! an exhausted retry loop apart from a single-shot failure.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, throttled or anti-bot
/// vendor responses) should return `true`. Permanent failures (malformed
/// records, bad configuration, I/O) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            // Malformed envelopes usually mean rate limiting or an anti-bot
            // interstitial rather than a real schema change
            Error::ApiFailure(_) | Error::MissingData | Error::EmptyItems => true,
            Error::Config { .. }
            | Error::MalformedRecord(_)
            | Error::InvalidUrl { .. }
            | Error::RetriesExhausted { .. }
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Spreadsheet(_) => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// Makes up to `config.max_attempts` total attempts (the initial call
/// included). Between attempts the delay grows by `backoff_multiplier`,
/// capped at `max_delay`, with optional jitter.
///
/// Returns the successful result, the first non-retryable error, or
/// [`Error::RetriesExhausted`] wrapping the last retryable error once the
/// attempt budget is spent.
pub async fn fetch_with_retry<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 1;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                let wait = if config.jitter { add_jitter(delay) } else { delay };
                tokio::time::sleep(wait).await;

                let next = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next.min(config.max_delay);
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                tracing::error!(
                    error = %e,
                    attempts = attempt,
                    "retry budget exhausted"
                );
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(e),
                });
            }
            Err(e) => {
                tracing::error!(error = %e, "operation failed with non-retryable error");
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay falls between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
