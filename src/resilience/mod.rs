//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to an external collaborator:
//!     → timeouts.rs (Scope: shared deadline + cancellation)
//!     → On failure: retries.rs (check if retryable, retry with backoff)
//!     → backoff.rs (jittered exponential delay)
//! ```
//!
//! # Design Decisions
//! - Every external call runs inside a Scope; nothing outlives its deadline
//! - Retries only for transient failures
//! - Backoff waits are cancellable

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use timeouts::{Scope, ScopeError};
