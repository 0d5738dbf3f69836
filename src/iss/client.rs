//! ISS REST client with connection limiting, timeouts and retries.
//!
//! # Responsibilities
//! - Issue GET requests against the ISS JSON API
//! - Cap concurrent requests at `max_connections`
//! - Decode ISS "columns + data" blocks into typed rows
//! - Retry transient failures within the caller's scope

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::iss::types::{DateRange, IssConfig, IssError, IssResult, MarketDates};
use crate::observability::metrics;
use crate::resilience::retries::{with_retries, RetryPolicy};
use crate::resilience::Scope;

/// One ISS table block in the compact `columns` + `data` layout.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub columns: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

impl Block {
    fn column(&self, name: &str) -> IssResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| IssError::Decode(format!("missing column '{}'", name)))
    }

    /// Decode every row into a `DateRange` using the `from` and `till` columns.
    pub fn date_ranges(&self) -> IssResult<Vec<DateRange>> {
        let from = self.column("from")?;
        let till = self.column("till")?;

        self.data
            .iter()
            .map(|row| {
                Ok(DateRange {
                    from: date_cell(row, from)?,
                    till: date_cell(row, till)?,
                })
            })
            .collect()
    }
}

fn date_cell(row: &[Value], idx: usize) -> IssResult<NaiveDate> {
    let raw = row
        .get(idx)
        .and_then(Value::as_str)
        .ok_or_else(|| IssError::Decode(format!("row has no date at column {}", idx)))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| IssError::Decode(format!("invalid date '{}': {}", raw, e)))
}

/// Shared ISS client.
///
/// Clones share the HTTP connection pool and the connection limit.
#[derive(Clone)]
pub struct IssClient {
    http: reqwest::Client,
    base_url: String,
    limiter: Arc<Semaphore>,
    config: IssConfig,
}

impl IssClient {
    /// Create a new client. No request is made.
    pub fn new(config: IssConfig) -> IssResult<Self> {
        url::Url::parse(&config.base_url)
            .map_err(|e| IssError::Http(format!("Invalid ISS URL '{}': {}", config.base_url, e)))?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(config.max_connections);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(|e| IssError::Http(e.to_string()))?;

        tracing::info!(
            base_url = %config.base_url,
            max_connections = config.max_connections,
            "ISS client initialized"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(Semaphore::new(config.max_connections.min(Semaphore::MAX_PERMITS))),
            config,
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.retry_attempts,
            base_delay_ms: self.config.retry_base_delay_ms,
            max_delay_ms: self.config.retry_max_delay_ms,
        }
    }

    /// Fetch a single named block from an ISS resource.
    ///
    /// `path` is relative to the base URL, e.g. `engines/stock/markets/shares/dates.json`.
    pub async fn block(&self, scope: &Scope, path: &str, name: &str) -> IssResult<Block> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let result = with_retries(scope, self.retry_policy(), || self.fetch_block(&url, name)).await;

        metrics::record_iss_request(match &result {
            Ok(_) => "ok",
            Err(IssError::Cancelled(_)) => "cancelled",
            Err(_) => "error",
        });
        result
    }

    async fn fetch_block(&self, url: &str, name: &str) -> IssResult<Block> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| IssError::Http("ISS client closed".to_string()))?;

        let response = self
            .http
            .get(url)
            .query(&[("iss.meta", "off"), ("iss.only", name)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IssError::Status(status.as_u16()));
        }

        let mut blocks: HashMap<String, Block> = response
            .json()
            .await
            .map_err(|e| IssError::Decode(e.to_string()))?;

        blocks
            .remove(name)
            .ok_or_else(|| IssError::Decode(format!("response has no '{}' block", name)))
    }

    fn transport_error(&self, err: reqwest::Error) -> IssError {
        if err.is_timeout() {
            IssError::Timeout(self.config.request_timeout_secs)
        } else {
            IssError::Http(err.to_string())
        }
    }
}

#[async_trait]
impl MarketDates for IssClient {
    async fn market_dates(
        &self,
        scope: &Scope,
        engine: &str,
        market: &str,
    ) -> IssResult<Vec<DateRange>> {
        let path = format!("engines/{}/markets/{}/dates.json", engine, market);
        self.block(scope, &path, "dates").await?.date_ranges()
    }
}

impl std::fmt::Debug for IssClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssClient")
            .field("base_url", &self.base_url)
            .field("max_connections", &self.config.max_connections)
            .field("timeout_secs", &self.config.request_timeout_secs)
            .finish()
    }
}
