//! Retry logic.
//!
//! # Responsibilities
//! - Determine if an ISS failure is retryable
//! - Execute retries with exponential backoff + jitter inside a scope
//!
//! # Design Decisions
//! - Connection errors, timeouts, 429 and 5xx are retryable
//! - Decode errors and other 4xx are not: retrying returns the same body
//! - Backoff sleeps race the caller's scope, so retries never outlive it
//! - A retry that cannot start before the deadline is skipped and the
//!   upstream error is returned instead of a cancellation

use std::future::Future;

use crate::iss::IssError;
use crate::resilience::backoff::retry_delay;
use crate::resilience::Scope;

/// Retry settings for one class of requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Whether another attempt could plausibly succeed.
pub fn is_retryable(err: &IssError) -> bool {
    match err {
        IssError::Http(_) | IssError::Timeout(_) => true,
        IssError::Status(status) => *status == 429 || *status >= 500,
        IssError::Decode(_) | IssError::Cancelled(_) => false,
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub async fn with_retries<T, F, Fut>(
    scope: &Scope,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, IssError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IssError>>,
{
    let mut attempt = 1;
    loop {
        let err = match scope.run(op()).await? {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= policy.max_attempts || !is_retryable(&err) {
            return Err(err);
        }

        let delay = retry_delay(&policy, attempt);
        if delay >= scope.remaining() {
            tracing::debug!(attempt, error = %err, "No scope budget left for another ISS attempt");
            return Err(err);
        }

        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "Retrying ISS request");
        scope.run(tokio::time::sleep(delay)).await?;
        attempt += 1;
    }
}
