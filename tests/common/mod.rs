//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use market_tables::iss::{DateRange, IssError, IssResult, MarketDates};
use market_tables::lifecycle::{Module, ModuleError};
use market_tables::resilience::Scope;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

/// A single ISS range ending on `till`.
pub fn range(till: u32) -> DateRange {
    DateRange { from: day(1), till: day(till) }
}

pub fn scope() -> Scope {
    Scope::with_timeout(Duration::from_secs(5))
}

/// Ordered record of module calls shared between modules of one test.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Module that writes `start:<name>` / `shutdown:<name>` into a journal.
pub struct Recording {
    pub name: String,
    pub journal: Journal,
    pub fail_start: bool,
    pub fail_shutdown: bool,
    pub deadlines: Arc<Mutex<Vec<tokio::time::Instant>>>,
}

impl Recording {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            fail_start: false,
            fail_shutdown: false,
            deadlines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Module> {
        Box::new(self)
    }
}

#[async_trait]
impl Module for Recording {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&mut self, scope: &Scope) -> Result<(), ModuleError> {
        self.journal.lock().unwrap().push(format!("start:{}", self.name));
        self.deadlines.lock().unwrap().push(scope.deadline());
        if self.fail_start {
            return Err(ModuleError::Failed(format!("{} refused to start", self.name)));
        }
        Ok(())
    }

    async fn shutdown(&mut self, scope: &Scope) -> Result<(), ModuleError> {
        self.journal.lock().unwrap().push(format!("shutdown:{}", self.name));
        self.deadlines.lock().unwrap().push(scope.deadline());
        if self.fail_shutdown {
            return Err(ModuleError::Failed(format!("{} refused to stop", self.name)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Response {
    Rows(Vec<DateRange>),
    Status(u16),
    Hang,
}

/// Scriptable `MarketDates` that also tracks call concurrency.
pub struct FakeDates {
    response: Mutex<Response>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeDates {
    pub fn new(rows: Vec<DateRange>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Response::Rows(rows)),
            delay: Mutex::new(Duration::ZERO),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn set_rows(&self, rows: Vec<DateRange>) {
        *self.response.lock().unwrap() = Response::Rows(rows);
    }

    pub fn set_status(&self, status: u16) {
        *self.response.lock().unwrap() = Response::Status(status);
    }

    /// Never answer; only the caller's scope can end the request.
    pub fn hang(&self) {
        *self.response.lock().unwrap() = Response::Hang;
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDates for FakeDates {
    async fn market_dates(
        &self,
        _scope: &Scope,
        _engine: &str,
        _market: &str,
    ) -> IssResult<Vec<DateRange>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self.response.lock().unwrap().clone();
        let result = match response {
            Response::Rows(rows) => Ok(rows),
            Response::Status(status) => Err(IssError::Status(status)),
            Response::Hang => std::future::pending().await,
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

async fn read_request_line(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Start a programmable mock HTTP backend on an ephemeral port.
///
/// `f` receives the request line (e.g. `GET /path?query HTTP/1.1`).
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let request_line = read_request_line(&mut socket).await;
                        let (status, body) = f(request_line).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
