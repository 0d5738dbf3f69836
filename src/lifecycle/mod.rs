//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (app.rs):
//!     Build modules → start each in order under one start Scope
//!
//! Wait (signals.rs):
//!     SIGTERM/SIGINT → leave Running
//!
//! Shutdown (app.rs):
//!     Shut each module down in reverse order under one shutdown Scope
//!
//! Background tasks (shutdown.rs):
//!     Module::shutdown → Shutdown::trigger → task loops exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: infrastructure first, user-facing modules last
//! - Fail fast: any startup error is fatal, nothing is rolled back
//! - Fail soft on shutdown: one stuck module cannot block the rest
//! - Each phase has one shared deadline, not one per module

pub mod app;
pub mod module;
pub mod shutdown;
pub mod signals;

pub use app::{App, LifecycleError, Phase};
pub use module::{Module, ModuleError};
pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::{Signal, Signals};
