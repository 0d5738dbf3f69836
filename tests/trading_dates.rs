//! Integration tests for the trading dates update protocol.

mod common;

use common::{day, range, scope, FakeDates};
use market_tables::iss::IssError;
use market_tables::resilience::{Scope, ScopeError};
use market_tables::tables::{Command, Table, TableError, TradingDates, TradingDatesFactory};
use std::sync::Arc;
use std::time::Duration;

fn table(iss: &Arc<FakeDates>) -> TradingDates {
    TradingDatesFactory::new(iss.clone()).trading_dates("trading_dates".into(), "trading_dates".into())
}

#[tokio::test]
async fn test_boundary_sequence_emits_only_on_advance() {
    let iss = FakeDates::new(vec![range(10)]);
    let mut table = table(&iss);
    let mut emitted = Vec::new();

    for till in [10, 10, 11, 11] {
        iss.set_rows(vec![range(till)]);
        let event = table.update(&scope(), &Command::default()).await.unwrap();
        emitted.push(event.map(|e| e.last_trading_date));
    }

    assert_eq!(emitted, vec![Some(day(10)), None, Some(day(11)), None]);
    assert_eq!(table.last_trading_date(), day(11));
    assert_eq!(iss.calls(), 4);
}

#[tokio::test]
async fn test_identical_updates_are_idempotent() {
    let iss = FakeDates::new(vec![range(12)]);
    let mut table = table(&iss);

    let first = table.update(&scope(), &Command::default()).await.unwrap();
    let after_first = table.snapshot();
    let second = table.update(&scope(), &Command::default()).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(table.snapshot(), after_first);
}

#[tokio::test]
async fn test_older_boundary_is_ignored() {
    let iss = FakeDates::new(vec![range(15)]);
    let mut table = table(&iss);
    table.update(&scope(), &Command::default()).await.unwrap();

    iss.set_rows(vec![range(14)]);
    let event = table.update(&scope(), &Command::default()).await.unwrap();

    assert!(event.is_none());
    assert_eq!(table.last_trading_date(), day(15));
    assert_eq!(table.rows(), &[range(15)]);
}

#[tokio::test]
async fn test_malformed_rows_leave_state_untouched() {
    let iss = FakeDates::new(vec![range(10)]);
    let mut table = table(&iss);
    table.update(&scope(), &Command::default()).await.unwrap();
    let before = table.snapshot();

    for rows in [Vec::new(), vec![range(11), range(12)]] {
        iss.set_rows(rows);
        let err = table.update(&scope(), &Command::default()).await.unwrap_err();
        assert!(matches!(err, TableError::Validation(_)), "got {:?}", err);
        assert_eq!(table.snapshot(), before);
    }
}

#[tokio::test]
async fn test_transport_error_reported() {
    let iss = FakeDates::new(Vec::new());
    iss.set_status(503);
    let mut table = table(&iss);

    let err = table.update(&scope(), &Command::default()).await.unwrap_err();
    assert!(matches!(err, TableError::Transport(IssError::Status(503))));
    assert!(table.rows().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_expired_scope_cancels_update() {
    let iss = FakeDates::new(vec![range(10)]);
    let mut table = table(&iss);
    table.update(&scope(), &Command::default()).await.unwrap();
    let before = table.snapshot();

    iss.hang();
    let short = Scope::with_timeout(Duration::from_millis(50));
    let err = table.update(&short, &Command::default()).await.unwrap_err();

    assert!(matches!(err, TableError::Cancelled(ScopeError::DeadlineExceeded)));
    assert_eq!(table.snapshot(), before);
}

#[tokio::test]
async fn test_cancelled_scope_rejects_update() {
    let iss = FakeDates::new(vec![range(10)]);
    let mut table = table(&iss);

    let scope = scope();
    scope.cancel();
    let err = table.update(&scope, &Command::default()).await.unwrap_err();

    assert!(matches!(err, TableError::Cancelled(ScopeError::Cancelled)));
    assert_eq!(iss.calls(), 0);
}
