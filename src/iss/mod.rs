//! MOEX ISS integration subsystem.
//!
//! # Data Flow
//! ```text
//! IssConfig (base URL, limits, retry budget)
//!     → client.rs (HTTP, connection cap, retries within a Scope)
//!     → Block (columns + data)
//!     → typed rows (DateRange)
//! ```
//!
//! # Design Decisions
//! - One client per process, shared by every table through an Arc
//! - Tables depend on the `MarketDates` trait, not on `IssClient`
//! - Every request observes the caller's Scope

pub mod client;
pub mod types;

pub use client::{Block, IssClient};
pub use types::{DateRange, IssConfig, IssError, IssResult, MarketDates, ENGINE_STOCK, MARKET_SHARES};
