//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Start and shutdown budgets for the orchestrator.
    pub lifecycle: LifecycleConfig,

    /// MOEX ISS client settings.
    pub iss: IssConfig,

    /// Table hosting and polling settings.
    pub tables: TablesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Persistence collaborator settings, passed through untouched.
    pub repository: RepositoryConfig,

    /// Event bus collaborator settings, passed through untouched.
    pub bus: BusConfig,

    /// HTTP server collaborator settings, passed through untouched.
    pub server: ServerConfig,
}

/// Lifecycle budgets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Shared budget for starting every module, in seconds.
    pub start_timeout_secs: u64,

    /// Shared budget for shutting every module down, in seconds.
    pub shutdown_timeout_secs: u64,
}

impl LifecycleConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 30,
            shutdown_timeout_secs: 30,
        }
    }
}

/// ISS client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IssConfig {
    /// Base URL of the ISS REST API.
    pub base_url: String,

    /// Maximum concurrent requests to ISS.
    pub max_connections: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Total attempts per request, including the first one.
    pub retry_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Upper bound on a single backoff delay in milliseconds.
    pub retry_max_delay_ms: u64,

    /// Honour HTTP(S)_PROXY environment variables.
    pub system_proxy: bool,
}

impl Default for IssConfig {
    fn default() -> Self {
        Self {
            base_url: "https://iss.moex.com/iss".to_string(),
            max_connections: 20,
            request_timeout_secs: 10,
            retry_attempts: 3,
            retry_base_delay_ms: 200,
            retry_max_delay_ms: 5_000,
            system_proxy: true,
        }
    }
}

/// Table hosting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TablesConfig {
    /// Interval between polling passes over all hosted tables, in seconds.
    pub update_interval_secs: u64,

    /// Buffered events per subscriber before lagging ones drop events.
    pub event_capacity: usize,

    /// Group of the trading dates table.
    pub group: String,

    /// Name of the trading dates table.
    pub name: String,
}

impl TablesConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 3_600,
            event_capacity: 64,
            group: "trading_dates".to_string(),
            name: "trading_dates".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,

    /// Emit logs as JSON lines instead of human readable text.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Persistence collaborator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub uri: String,
    pub database: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "data".to_string(),
        }
    }
}

/// Event bus collaborator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    /// Budget for handling a single event, in seconds.
    pub event_timeout_secs: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            event_timeout_secs: 30,
        }
    }
}

/// HTTP server collaborator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "localhost:3000".to_string(),
            request_timeout_secs: 1,
        }
    }
}
