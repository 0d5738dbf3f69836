//! Trading dates table: the range of dates the stock market traded on.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::iss::{DateRange, MarketDates, ENGINE_STOCK, MARKET_SHARES};
use crate::resilience::Scope;
use crate::tables::types::{Command, Event, Group, Name, TableError, TableId, TableResult};
use crate::tables::{Table, TableFactory};

/// Persisted state of a [`TradingDates`] table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    pub last_trading_date: NaiveDate,
    pub rows: Vec<DateRange>,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            last_trading_date: NaiveDate::MIN,
            rows: Vec::new(),
        }
    }
}

/// Table holding the single ISS trading date range of the shares market.
///
/// Identity comes from the factory. State starts empty and is expected to be
/// hydrated with [`TradingDates::restore`] by the persistence layer.
pub struct TradingDates {
    id: TableId,
    iss: Arc<dyn MarketDates>,
    state: TableState,
}

impl TradingDates {
    pub fn new(id: TableId, iss: Arc<dyn MarketDates>) -> Self {
        Self {
            id,
            iss,
            state: TableState::default(),
        }
    }

    pub fn last_trading_date(&self) -> NaiveDate {
        self.state.last_trading_date
    }

    pub fn rows(&self) -> &[DateRange] {
        &self.state.rows
    }

    pub fn snapshot(&self) -> TableState {
        self.state.clone()
    }

    /// Replace the whole state, e.g. with what the repository loaded.
    pub fn restore(&mut self, state: TableState) {
        self.state = state;
    }
}

#[async_trait]
impl Table for TradingDates {
    fn id(&self) -> &TableId {
        &self.id
    }

    async fn update(&mut self, scope: &Scope, _command: &Command) -> TableResult<Option<Event>> {
        let rows = scope
            .run(self.iss.market_dates(scope, ENGINE_STOCK, MARKET_SHARES))
            .await??;

        let [range] = rows.as_slice() else {
            return Err(TableError::Validation(format!(
                "expected exactly one date range, got {}",
                rows.len()
            )));
        };

        let last_trading_date = range.till;
        if last_trading_date <= self.state.last_trading_date {
            tracing::debug!(table = %self.id, %last_trading_date, "Trading dates unchanged");
            return Ok(None);
        }

        tracing::info!(
            table = %self.id,
            previous = %self.state.last_trading_date,
            %last_trading_date,
            "Trading dates advanced"
        );
        self.state = TableState {
            last_trading_date,
            rows,
        };

        Ok(Some(Event {
            id: self.id.clone(),
            last_trading_date,
        }))
    }
}

impl std::fmt::Debug for TradingDates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingDates")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}

/// Builds trading dates tables sharing one ISS client.
#[derive(Clone)]
pub struct TradingDatesFactory {
    iss: Arc<dyn MarketDates>,
}

impl TradingDatesFactory {
    pub fn new(iss: Arc<dyn MarketDates>) -> Self {
        Self { iss }
    }

    /// Concrete variant of [`TableFactory::new_table`].
    pub fn trading_dates(&self, group: Group, name: Name) -> TradingDates {
        TradingDates::new(TableId { group, name }, Arc::clone(&self.iss))
    }
}

impl TableFactory for TradingDatesFactory {
    fn new_table(&self, group: Group, name: Name) -> Box<dyn Table> {
        Box::new(self.trading_dates(group, name))
    }
}
