//! Market reference tables service.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                        MARKET TABLES                          │
//!   │                                                               │
//!   │   lifecycle::App                                              │
//!   │     start (in order) ──▶ wait SIGINT/SIGTERM ──▶ shutdown      │
//!   │          │                                       (reverse)    │
//!   │          ▼                                                    │
//!   │   ┌──────────────┐   update    ┌──────────────┐   HTTP        │
//!   │   │  TableHost   │────────────▶│ TradingDates │──────────────┼──▶ MOEX ISS
//!   │   │ (poll + bus) │◀── Event ───│    table     │  IssClient    │
//!   │   └──────────────┘             └──────────────┘               │
//!   │                                                               │
//!   │   Cross-cutting: config · observability · resilience (Scope)  │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use market_tables::config::{self, AppConfig};
use market_tables::iss::{IssClient, MarketDates};
use market_tables::lifecycle::{App, Module};
use market_tables::observability::{logging, metrics};
use market_tables::resilience::Scope;
use market_tables::tables::{Command, Table, TableFactory, TableHost, TradingDatesFactory};

#[derive(Parser)]
#[command(name = "market-tables")]
#[command(about = "Keeps market reference tables in sync with MOEX ISS", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start all modules and run until SIGINT or SIGTERM
    Run,
    /// Validate the config, update the trading dates table once and print it
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "market-tables starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config).await,
        Commands::Check => check(config).await,
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        start_timeout_secs = config.lifecycle.start_timeout_secs,
        shutdown_timeout_secs = config.lifecycle.shutdown_timeout_secs,
        iss_url = %config.iss.base_url,
        repository_db = %config.repository.database,
        server_address = %config.server.address,
        bus_event_timeout_secs = config.bus.event_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let iss: Arc<dyn MarketDates> = Arc::new(IssClient::new(config.iss.clone())?);
    let factory = TradingDatesFactory::new(iss);

    let mut host = TableHost::new(&config.tables);
    host.register(factory.new_table(
        config.tables.group.clone().into(),
        config.tables.name.clone().into(),
    ));
    tracing::info!(tables = ?host.table_ids().collect::<Vec<_>>(), "Tables registered");

    let mut events = host.subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    table = %event.id,
                    last_trading_date = %event.last_trading_date,
                    "Table updated"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event log lagging behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let modules: Vec<Box<dyn Module>> = vec![Box::new(host)];
    let mut app = App::new(&config.lifecycle, modules);

    if let Err(e) = app.run().await {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn check(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let iss: Arc<dyn MarketDates> = Arc::new(IssClient::new(config.iss.clone())?);
    let mut table = TradingDatesFactory::new(iss).trading_dates(
        config.tables.group.clone().into(),
        config.tables.name.clone().into(),
    );

    let scope = Scope::with_timeout(config.lifecycle.start_timeout());
    let event = table.update(&scope, &Command::default()).await?;

    let report = serde_json::json!({
        "table": table.id().to_string(),
        "event": event,
        "state": table.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
