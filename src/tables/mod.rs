//! Externally backed tables with idempotent updates.
//!
//! # Data Flow
//! ```text
//! TableHost (poll tick or explicit update)
//!     → Table::update(scope, command)
//!         → MarketDates fetch (ISS)
//!         → shape validation
//!         → compare boundary: not newer → Ok(None)
//!                             newer     → replace state, Ok(Some(Event))
//!     → broadcast Event
//! ```
//!
//! # Design Decisions
//! - Repeated updates against unchanged upstream data are side-effect free
//! - Boundary and rows change together or not at all
//! - Tables hold no locks; callers guarantee one update at a time per table

pub mod host;
pub mod trading_dates;
pub mod types;

use async_trait::async_trait;

use crate::resilience::Scope;

pub use host::TableHost;
pub use trading_dates::{TableState, TradingDates, TradingDatesFactory};
pub use types::{Command, Event, Group, Name, TableError, TableId, TableResult};

/// A named dataset refreshed from an external source.
///
/// `update` takes `&mut self`: at most one update may run per table at a
/// time. Shared owners must serialize calls, as [`TableHost`] does.
#[async_trait]
pub trait Table: Send {
    fn id(&self) -> &TableId;

    fn group(&self) -> &Group {
        &self.id().group
    }

    fn name(&self) -> &Name {
        &self.id().name
    }

    /// Fetch fresh data and apply it if it is strictly newer.
    ///
    /// Returns `Ok(None)` when nothing changed. Errors leave the table as it was.
    async fn update(&mut self, scope: &Scope, command: &Command) -> TableResult<Option<Event>>;
}

/// Builds tables bound to a shared external client.
pub trait TableFactory {
    fn new_table(&self, group: Group, name: Name) -> Box<dyn Table>;
}
