//! The capability every managed subsystem implements.

use async_trait::async_trait;
use thiserror::Error;

use crate::iss::IssError;
use crate::resilience::{Scope, ScopeError};
use crate::tables::TableError;

/// Errors a module can report from `start` or `shutdown`.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The phase scope ended before the module finished.
    #[error("scope ended: {0}")]
    Cancelled(#[from] ScopeError),

    /// Module-specific failure.
    #[error("{0}")]
    Failed(String),

    #[error("table error: {0}")]
    Table(#[from] TableError),

    #[error("ISS error: {0}")]
    Iss(#[from] IssError),
}

/// A start/stop-capable subsystem managed by [`crate::lifecycle::App`].
///
/// Both operations receive the phase scope shared by every module in that
/// phase and are expected to return promptly once it is done. The
/// orchestrator does not enforce the deadline.
#[async_trait]
pub trait Module: Send {
    /// Label used in logs and metrics.
    ///
    /// Defaults to the bare type name with module path and generic
    /// arguments stripped, so `Cache<Pool>` is reported as `Cache`.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let path = full.split('<').next().unwrap_or(full);
        path.rsplit("::").next().unwrap_or(path)
    }

    async fn start(&mut self, scope: &Scope) -> Result<(), ModuleError>;

    async fn shutdown(&mut self, scope: &Scope) -> Result<(), ModuleError>;
}
