//! ISS data types, errors and the client seam used by tables.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::Scope;

// Re-export IssConfig from config module to avoid duplication
pub use crate::config::schema::IssConfig;

/// Stock engine identifier.
pub const ENGINE_STOCK: &str = "stock";

/// Shares market identifier.
pub const MARKET_SHARES: &str = "shares";

/// Errors that can occur while talking to ISS.
#[derive(Debug, Error)]
pub enum IssError {
    /// Connection or request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("ISS timeout after {0} seconds")]
    Timeout(u64),

    /// ISS answered with a non-success status.
    #[error("ISS returned status {0}")]
    Status(u16),

    /// Response body did not match the expected layout.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The calling scope expired or was cancelled.
    #[error("ISS request cancelled: {0}")]
    Cancelled(#[from] crate::resilience::ScopeError),
}

/// Result type for ISS operations.
pub type IssResult<T> = Result<T, IssError>;

/// A trading date range as reported by ISS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub till: NaiveDate,
}

/// Source of market trading date ranges.
///
/// The seam between tables and the external client. Implementations are
/// shared between tables through an `Arc`.
#[async_trait]
pub trait MarketDates: Send + Sync {
    /// Fetch the trading date ranges for an engine and market.
    async fn market_dates(
        &self,
        scope: &Scope,
        engine: &str,
        market: &str,
    ) -> IssResult<Vec<DateRange>>;
}
