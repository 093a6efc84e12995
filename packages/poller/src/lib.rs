#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Timer-driven polling of the GDELT Pulse events endpoint.
//!
//! The poller keeps the [`Store`](gdelt_pulse_store::Store) fed: it
//! fetches on start, on every refresh interval, whenever the selected
//! time window changes, and on demand. Identical requests inside the
//! de-duplication interval are answered from the last response. A failed
//! request is retried a bounded number of times with a fixed delay before
//! the failure is surfaced in the store's error field.

pub mod task;

use std::time::Duration;

use async_trait::async_trait;
use gdelt_pulse_event_models::TimeWindow;
use gdelt_pulse_server_models::{ApiErrorResponse, EventsResponse};
use serde::Deserialize;

pub use task::{Poller, PollerHandle};

/// Errors that can occur while fetching from the events endpoint.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP error! status: {status}{}", .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Status {
        status: reqwest::StatusCode,
        /// `message` from the error body, when it had one.
        message: Option<String>,
    },

    /// The poller configuration could not be read.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A duration that must be positive was zero.
    #[error("config error: {key} must be greater than zero")]
    ZeroDuration { key: &'static str },
}

/// Polling cadence and retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Base URL of the API server, e.g. `http://127.0.0.1:8080`.
    pub endpoint: String,
    /// Time between scheduled refetches.
    pub refresh_interval: Duration,
    /// Requests for the same window inside this interval reuse the last
    /// response.
    pub dedupe_interval: Duration,
    /// Attempts after the first failure.
    pub retry_count: u32,
    /// Fixed delay between attempts.
    pub retry_interval: Duration,
    /// Timeout for one request to the events endpoint.
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            refresh_interval: Duration::from_secs(5 * 60),
            dedupe_interval: Duration::from_secs(2 * 60),
            retry_count: 3,
            retry_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// On-disk shape of [`PollerConfig`]; durations in seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PollerConfigFile {
    endpoint: Option<String>,
    refresh_interval_secs: Option<u64>,
    dedupe_interval_secs: Option<u64>,
    retry_count: Option<u32>,
    retry_interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

impl PollerConfig {
    /// Parses a TOML poller config. Absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Config`] on malformed TOML or unknown keys, and
    /// [`PollError::ZeroDuration`] if the refresh interval or request
    /// timeout is zero.
    pub fn from_toml_str(s: &str) -> Result<Self, PollError> {
        let file: PollerConfigFile = toml::from_str(s)?;
        let defaults = Self::default();
        let secs = |value: Option<u64>, default: Duration| value.map_or(default, Duration::from_secs);

        let config = Self {
            endpoint: file.endpoint.unwrap_or(defaults.endpoint),
            refresh_interval: secs(file.refresh_interval_secs, defaults.refresh_interval),
            dedupe_interval: secs(file.dedupe_interval_secs, defaults.dedupe_interval),
            retry_count: file.retry_count.unwrap_or(defaults.retry_count),
            retry_interval: secs(file.retry_interval_secs, defaults.retry_interval),
            request_timeout: secs(file.request_timeout_secs, defaults.request_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the durations that cannot be zero. A zero dedupe or retry
    /// interval is allowed and disables the respective delay.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::ZeroDuration`] naming the offending key.
    pub const fn validate(&self) -> Result<(), PollError> {
        if self.refresh_interval.is_zero() {
            return Err(PollError::ZeroDuration {
                key: "refresh_interval_secs",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(PollError::ZeroDuration {
                key: "request_timeout_secs",
            });
        }
        Ok(())
    }
}

/// Anything that can answer an events request for a time window.
#[async_trait]
pub trait EventsSource: Send + Sync {
    /// Fetches the aggregated events for `window`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError`] if the request fails or the response cannot
    /// be decoded.
    async fn fetch_events(&self, window: TimeWindow) -> Result<EventsResponse, PollError>;
}

/// [`EventsSource`] backed by the `GET /api/events` endpoint.
#[derive(Debug, Clone)]
pub struct HttpEventsSource {
    client: reqwest::Client,
    url: String,
}

impl HttpEventsSource {
    /// Creates a source for the server at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Http`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, PollError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/api/events", endpoint.trim_end_matches('/')),
        })
    }

    /// Builds a source from `config.endpoint` and `config.request_timeout`.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_config(config: &PollerConfig) -> Result<Self, PollError> {
        Self::new(&config.endpoint, config.request_timeout)
    }
}

#[async_trait]
impl EventsSource for HttpEventsSource {
    async fn fetch_events(&self, window: TimeWindow) -> Result<EventsResponse, PollError> {
        log::debug!("GET {}?timeFilter={window}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .query(&[("timeFilter", window.as_ref())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .map(|e| e.message);
            return Err(PollError::Status { status, message });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Fetches `window`, retrying up to `retry_count` more times with a
/// fixed `retry_interval` between attempts.
///
/// # Errors
///
/// Returns the last [`PollError`] once all attempts have failed.
pub async fn fetch_with_retry(
    source: &dyn EventsSource,
    window: TimeWindow,
    retry_count: u32,
    retry_interval: Duration,
) -> Result<EventsResponse, PollError> {
    let mut attempt = 0;
    loop {
        match source.fetch_events(window).await {
            Ok(response) => return Ok(response),
            Err(e) if attempt < retry_count => {
                attempt += 1;
                log::warn!("Events fetch failed: {e}");
                log::warn!("  retry {attempt}/{retry_count} in {retry_interval:?}...");
                tokio::time::sleep(retry_interval).await;
            }
            Err(e) => return Err(e),
        }
    }
}
