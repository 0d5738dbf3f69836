//! Market reference tables service library.

pub mod config;
pub mod iss;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod tables;

pub use config::AppConfig;
pub use lifecycle::{App, Module, ModuleError};
pub use resilience::Scope;
pub use tables::{Table, TableFactory, TableHost};
