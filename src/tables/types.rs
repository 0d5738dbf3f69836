//! Table identities, commands, events and errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::iss::IssError;
use crate::resilience::ScopeError;

/// Logical group a table belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(String);

/// Name of a table within its group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

macro_rules! string_token {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_token!(Group);
string_token!(Name);

/// Identity of a table: where its data logically lives.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId {
    pub group: Group,
    pub name: Name,
}

impl TableId {
    pub fn new(group: impl Into<Group>, name: impl Into<Name>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Parameters of a table update. Currently carries nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct Command {}

/// Emitted when an update moved a table to a newer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: TableId,
    pub last_trading_date: NaiveDate,
}

/// Errors a table update can report. None of them change table state.
#[derive(Debug, Error)]
pub enum TableError {
    /// The fetched rows do not have the expected shape.
    #[error("rows validation failed: {0}")]
    Validation(String),

    /// The external source could not be reached or answered garbage.
    #[error("transport error: {0}")]
    Transport(#[source] IssError),

    /// The update scope ended before the fetch completed.
    #[error("update cancelled: {0}")]
    Cancelled(#[from] ScopeError),

    #[error("unknown table {0}")]
    UnknownTable(TableId),
}

impl From<IssError> for TableError {
    fn from(err: IssError) -> Self {
        match err {
            IssError::Cancelled(reason) => TableError::Cancelled(reason),
            other => TableError::Transport(other),
        }
    }
}

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_id_display() {
        let id = TableId::new("trading_dates", "trading_dates");
        assert_eq!(id.to_string(), "trading_dates/trading_dates");
        assert_eq!(id.group.as_str(), "trading_dates");
    }

    #[test]
    fn test_cancelled_fetch_is_not_transport() {
        let err = TableError::from(IssError::Cancelled(ScopeError::DeadlineExceeded));
        assert!(matches!(err, TableError::Cancelled(ScopeError::DeadlineExceeded)));

        let err = TableError::from(IssError::Status(503));
        assert!(matches!(err, TableError::Transport(IssError::Status(503))));
    }

    #[test]
    fn test_event_serialization() {
        let event = Event {
            id: TableId::new("g", "n"),
            last_trading_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": {"group": "g", "name": "n"}, "last_trading_date": "2024-05-10"})
        );
    }
}
