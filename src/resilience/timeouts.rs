//! Deadline-bounded cancellation scopes.
//!
//! # Responsibilities
//! - Carry a deadline and a cancellation signal into every module and table call
//! - Let callers race a future against the scope
//! - Report expiry distinctly from explicit cancellation

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Longest deadline a scope carries, roughly thirty years.
pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Why a scope stopped an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// The scope deadline elapsed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The scope was cancelled before its deadline.
    #[error("cancelled")]
    Cancelled,
}

/// A deadline plus a cancellation token.
///
/// Clones share the same token, so cancelling one cancels all.
#[derive(Debug, Clone)]
pub struct Scope {
    deadline: Instant,
    token: CancellationToken,
}

impl Scope {
    /// Create a scope expiring `timeout` from now.
    ///
    /// Timeouts too large to represent are clamped to [`FAR_FUTURE`].
    pub fn with_timeout(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(timeout.min(FAR_FUTURE)).unwrap_or(now),
            token: CancellationToken::new(),
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left before the deadline, zero once elapsed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the reason the scope is finished, if it is.
    pub fn check(&self) -> Result<(), ScopeError> {
        if self.token.is_cancelled() {
            Err(ScopeError::Cancelled)
        } else if Instant::now() >= self.deadline {
            Err(ScopeError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Resolves once the scope is cancelled or its deadline passes.
    pub async fn done(&self) -> ScopeError {
        tokio::select! {
            _ = self.token.cancelled() => ScopeError::Cancelled,
            _ = sleep_until(self.deadline) => ScopeError::DeadlineExceeded,
        }
    }

    /// Run `fut` until it completes or the scope finishes, whichever is first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ScopeError>
    where
        F: Future,
    {
        self.check()?;
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            output = fut => Ok(output),
        }
    }
}
