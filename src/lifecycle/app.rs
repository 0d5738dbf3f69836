//! Ordered start and reverse-order shutdown of service modules.

use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::LifecycleConfig;
use crate::lifecycle::module::{Module, ModuleError};
use crate::lifecycle::signals::Signals;
use crate::observability::metrics;
use crate::resilience::Scope;

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Errors that abort the whole application.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A module failed to start. Already started modules are left as is.
    #[error("module {module} failed to start: {source}")]
    Start {
        module: String,
        #[source]
        source: ModuleError,
    },

    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

/// Runs a fixed, ordered list of modules.
///
/// Modules start in declared order under one shared start scope, and shut
/// down in exact reverse order under a second, independent scope. Start
/// failures are fatal; shutdown failures are logged and skipped.
pub struct App {
    start_timeout: Duration,
    shutdown_timeout: Duration,
    modules: Vec<Box<dyn Module>>,
    phase: Phase,
}

impl App {
    pub fn new(config: &LifecycleConfig, modules: Vec<Box<dyn Module>>) -> Self {
        Self {
            start_timeout: config.start_timeout(),
            shutdown_timeout: config.shutdown_timeout(),
            modules,
            phase: Phase::Created,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Start all modules, block until SIGINT or SIGTERM, then shut down.
    pub async fn run(&mut self) -> Result<(), LifecycleError> {
        let mut signals = Signals::register().map_err(LifecycleError::Signals)?;
        self.run_until(async move {
            let signal = signals.recv().await;
            tracing::info!(%signal, "Termination signal received");
        })
        .await
    }

    /// Like [`App::run`], with `stop` standing in for the termination signal.
    pub async fn run_until<F>(&mut self, stop: F) -> Result<F::Output, LifecycleError>
    where
        F: Future,
    {
        self.start_modules().await?;
        let output = stop.await;
        self.shutdown_modules().await;
        Ok(output)
    }

    /// Start every module in order. Stops at the first failure.
    pub async fn start_modules(&mut self) -> Result<(), LifecycleError> {
        self.phase = Phase::Starting;
        let started = Instant::now();
        let scope = Scope::with_timeout(self.start_timeout);

        tracing::info!(
            modules = self.modules.len(),
            timeout_secs = self.start_timeout.as_secs(),
            "Starting"
        );

        for module in self.modules.iter_mut() {
            let module_started = Instant::now();
            let result = module.start(&scope).await;
            let name = module.name().to_string();
            metrics::record_module_transition(&name, "start", result.is_ok());

            if let Err(source) = result {
                tracing::error!(module = %name, error = %source, "Module failed to start");
                return Err(LifecycleError::Start { module: name, source });
            }

            tracing::info!(
                module = %name,
                elapsed_ms = module_started.elapsed().as_millis() as u64,
                budget_left_ms = scope.remaining().as_millis() as u64,
                "Module started"
            );
        }

        self.phase = Phase::Running;
        metrics::record_phase_duration("start", started);
        tracing::info!("Started");
        Ok(())
    }

    /// Shut every module down in reverse order. Never fails.
    pub async fn shutdown_modules(&mut self) {
        self.phase = Phase::Stopping;
        let started = Instant::now();
        let scope = Scope::with_timeout(self.shutdown_timeout);

        tracing::info!(timeout_secs = self.shutdown_timeout.as_secs(), "Stopping");

        for module in self.modules.iter_mut().rev() {
            let result = module.shutdown(&scope).await;
            let name = module.name();
            metrics::record_module_transition(name, "shutdown", result.is_ok());

            match result {
                Ok(()) => tracing::info!(module = %name, "Module stopped"),
                Err(e) => tracing::warn!(module = %name, error = %e, "Module failed to stop"),
            }
        }

        self.phase = Phase::Stopped;
        metrics::record_phase_duration("shutdown", started);
        tracing::info!("Stopped");
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("phase", &self.phase)
            .field("modules", &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("start_timeout", &self.start_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}
