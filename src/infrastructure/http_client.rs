//! HTTP client for page fetching with a per-origin politeness delay
//!
//! One GET per call, no cookie store, fixed browser-like user agent. A shared
//! gate spaces requests to the origin even when a worker pool is enabled;
//! retry policy lives with the caller, which owns the attempt loop.

use reqwest::{Client, ClientBuilder};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use crate::infrastructure::config::ScrapingConfig;

/// Failure of one fetch attempt.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("HTTP error {status}: {url}")]
    Status { status: u16, url: String },

    #[error("request failed for {url}: {message}")]
    Transport { message: String, url: String },
}

impl FetchError {
    /// Field label used in the errors dataset for request-level failures.
    pub fn field_label(&self) -> &'static str {
        match self {
            FetchError::Status { .. } => "http_request",
            FetchError::Transport { .. } => "request",
        }
    }
}

/// Spaces requests to one origin so the configured minimum delay elapses
/// between request starts, across however many workers share the client.
#[derive(Debug)]
pub struct PolitenessGate {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl PolitenessGate {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until the delay since the previous request has elapsed, then
    /// claim the slot. Holding the lock through the wait keeps concurrent
    /// callers in line instead of releasing them in a burst.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_delay;
            if ready_at > Instant::now() {
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// HTTP client shared by detail scraping and listing discovery.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    gate: Arc<PolitenessGate>,
}

impl HttpClient {
    pub fn new(config: &ScrapingConfig) -> anyhow::Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            gate: Arc::new(PolitenessGate::new(config.request_delay())),
        })
    }

    /// Fetch one page body. A non-2xx status or transport error is a single
    /// attempt failure; whether to retry is the caller's decision.
    pub async fn fetch_body(&self, url: &str) -> Result<String, FetchError> {
        self.gate.acquire().await;

        debug!("🌐 HTTP GET: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
                url: url.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ HTTP error {} for {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Transport {
            message: e.to_string(),
            url: url.to_string(),
        })?;

        if body.is_empty() {
            return Err(FetchError::Transport {
                message: "empty response body".to_string(),
                url: url.to_string(),
            });
        }

        Ok(body)
    }
}
