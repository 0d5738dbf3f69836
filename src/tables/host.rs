//! Module that hosts tables, serializes their updates and publishes events.
//!
//! # Responsibilities
//! - Own every registered table behind its own mutex
//! - Run one update pass at start and then one per interval
//! - Fail start when the initial pass exhausts the start scope
//! - Publish events on a broadcast channel
//!
//! # Design Decisions
//! - Tables never see concurrent `update` calls: the mutex is the
//!   single-flight guarantee the protocol relies on
//! - A failing table is logged and retried next pass; it never stops the host
//! - A pass is dropped mid-flight on shutdown; table updates are all-or-nothing

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::TablesConfig;
use crate::lifecycle::{Module, ModuleError, Shutdown};
use crate::observability::metrics;
use crate::resilience::timeouts::FAR_FUTURE;
use crate::resilience::Scope;
use crate::tables::types::{Command, Event, TableError, TableId, TableResult};
use crate::tables::Table;

type SharedTable = Arc<Mutex<Box<dyn Table>>>;
type Tables = BTreeMap<TableId, SharedTable>;

/// Hosts tables and keeps them fresh.
pub struct TableHost {
    tables: Tables,
    events: broadcast::Sender<Event>,
    interval: Duration,
    shutdown: Shutdown,
    poller: Option<JoinHandle<()>>,
}

impl TableHost {
    pub fn new(config: &TablesConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            tables: BTreeMap::new(),
            events,
            interval: config.update_interval(),
            shutdown: Shutdown::new(),
            poller: None,
        }
    }

    /// Add a table. A table with the same identity is replaced.
    pub fn register(&mut self, table: Box<dyn Table>) {
        let id = table.id().clone();
        if self.tables.insert(id.clone(), Arc::new(Mutex::new(table))).is_some() {
            tracing::warn!(table = %id, "Replacing already registered table");
        } else {
            tracing::debug!(table = %id, "Table registered");
        }
    }

    pub fn table_ids(&self) -> impl Iterator<Item = &TableId> {
        self.tables.keys()
    }

    /// Receive every event produced by hosted tables from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Update one table, waiting for any in-flight update of it to finish first.
    pub async fn update(
        &self,
        id: &TableId,
        scope: &Scope,
        command: &Command,
    ) -> TableResult<Option<Event>> {
        let table = self
            .tables
            .get(id)
            .ok_or_else(|| TableError::UnknownTable(id.clone()))?;
        update_table(id, table, &self.events, scope, command).await
    }
}

async fn update_table(
    id: &TableId,
    table: &SharedTable,
    events: &broadcast::Sender<Event>,
    scope: &Scope,
    command: &Command,
) -> TableResult<Option<Event>> {
    let result = {
        let mut table = scope.run(table.lock()).await?;
        table.update(scope, command).await
    };

    let label = id.to_string();
    match &result {
        Ok(Some(event)) => {
            metrics::record_table_update(&label, "event");
            if events.send(event.clone()).is_err() {
                tracing::debug!(table = %id, "No event subscribers");
            }
        }
        Ok(None) => metrics::record_table_update(&label, "unchanged"),
        Err(TableError::Validation(_)) => metrics::record_table_update(&label, "validation_error"),
        Err(TableError::Cancelled(_)) => metrics::record_table_update(&label, "cancelled"),
        Err(_) => metrics::record_table_update(&label, "transport_error"),
    }
    result
}

/// Update every table once, logging failures.
async fn update_all(tables: &Tables, events: &broadcast::Sender<Event>, scope: &Scope) {
    let command = Command::default();
    for (id, table) in tables {
        if let Err(e) = update_table(id, table, events, scope, &command).await {
            tracing::warn!(table = %id, error = %e, "Table update failed");
        }
    }
}

#[async_trait]
impl Module for TableHost {
    async fn start(&mut self, scope: &Scope) -> Result<(), ModuleError> {
        if self.poller.is_some() {
            return Err(ModuleError::Failed("table host already started".to_string()));
        }
        if self.shutdown.is_triggered() {
            return Err(ModuleError::Failed("table host already stopped".to_string()));
        }

        // Stale tables are recoverable; an exhausted start scope is not.
        update_all(&self.tables, &self.events, scope).await;
        scope.check()?;

        let tables = self.tables.clone();
        let events = self.events.clone();
        let interval = self.interval.clamp(Duration::from_millis(1), FAR_FUTURE);
        let mut shutdown = self.shutdown.subscribe();

        self.poller = Some(tokio::spawn(async move {
            let now = Instant::now();
            let mut ticker = time::interval_at(now.checked_add(interval).unwrap_or(now), interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let pass = Scope::with_timeout(interval);
                        tokio::select! {
                            _ = update_all(&tables, &events, &pass) => {}
                            _ = shutdown.wait() => break,
                        }
                    }
                    _ = shutdown.wait() => break,
                }
            }
            tracing::debug!("Table poller exited");
        }));

        tracing::info!(
            tables = self.tables.len(),
            interval_secs = self.interval.as_secs(),
            "Table host polling"
        );
        Ok(())
    }

    async fn shutdown(&mut self, scope: &Scope) -> Result<(), ModuleError> {
        self.shutdown.trigger();

        let Some(mut poller) = self.poller.take() else {
            return Ok(());
        };

        let outcome = scope.run(&mut poller).await;
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ModuleError::Failed(format!("table poller failed: {}", e))),
            Err(reason) => {
                poller.abort();
                Err(ModuleError::Cancelled(reason))
            }
        }
    }
}

impl std::fmt::Debug for TableHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHost")
            .field("tables", &self.table_ids().collect::<Vec<_>>())
            .field("interval", &self.interval)
            .field("running", &self.poller.is_some())
            .finish()
    }
}
