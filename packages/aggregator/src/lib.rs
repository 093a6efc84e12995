#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parallel per-category GDELT fetch, normalization, and aggregation.
//!
//! One upstream request is issued per requested [`Category`]. All requests
//! run concurrently and the aggregator waits for every one of them to
//! settle before combining the results. A failing category contributes
//! no events and sets [`Aggregation::has_errors`]; it never fails the
//! whole aggregation.

pub mod normalize;

use std::time::Duration;

use futures::future::join_all;
use gdelt_pulse_event_models::{Category, EventRecord, TimeWindow};

pub use normalize::normalize_features;

/// GDELT GEO 2.0 endpoint.
pub const UPSTREAM_BASE_URL: &str = "https://api.gdeltproject.org/api/v2/geo/geo";

/// Per-request upstream timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "GDELT-Pulse/1.0";

/// Errors from a single upstream category fetch.
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// Transport failure, including timeouts.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream answered with a non-2xx status.
    #[error("GDELT API error: {status}")]
    Status {
        /// The response status.
        status: reqwest::StatusCode,
    },

    /// The body decoded but carried no `features` array.
    #[error("no features in GDELT response")]
    MissingFeatures,

    /// Invalid aggregator configuration (bad base URL, client build failure).
    #[error("configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Settings for the upstream client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Upstream endpoint, without query string.
    pub base_url: String,
    /// Timeout applied to each upstream request.
    pub timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_url: UPSTREAM_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl AggregatorConfig {
    /// Reads `GDELT_BASE_URL` and `GDELT_TIMEOUT_SECS`, falling back to
    /// the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("GDELT_BASE_URL").unwrap_or(defaults.base_url);
        let timeout = std::env::var("GDELT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(defaults.timeout, Duration::from_secs);
        Self { base_url, timeout }
    }
}

/// Builds the upstream query URL for one category and time window.
///
/// # Errors
///
/// Returns [`AggregatorError::Config`] if `base_url` is not a valid URL.
pub fn upstream_url(
    base_url: &str,
    category: Category,
    window: TimeWindow,
) -> Result<reqwest::Url, AggregatorError> {
    reqwest::Url::parse_with_params(
        base_url,
        &[
            ("query", category.query()),
            ("mode", "PointData"),
            ("format", "GeoJSON"),
            ("timespan", window.timespan().as_str()),
        ],
    )
    .map_err(|e| AggregatorError::Config {
        message: format!("invalid upstream URL '{base_url}': {e}"),
    })
}

/// Combined result of a multi-category fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// Events from every successful category, in request order.
    pub events: Vec<EventRecord>,
    /// Categories that were requested, in request order.
    pub categories: Vec<Category>,
    pub time_window: TimeWindow,
    /// Whether at least one category failed.
    pub has_errors: bool,
    /// The categories that failed.
    pub failed: Vec<Category>,
}

/// Upstream client shared across requests.
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: reqwest::Client,
    base_url: String,
}

impl Aggregator {
    /// Creates an aggregator with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Config`] if the base URL is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: &AggregatorConfig) -> Result<Self, AggregatorError> {
        reqwest::Url::parse(&config.base_url).map_err(|e| AggregatorError::Config {
            message: format!("invalid upstream URL '{}': {e}", config.base_url),
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AggregatorError::Config {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Fetches and normalizes one category.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError`] on transport failure or timeout, a
    /// non-2xx status, an undecodable body, or a body without a
    /// `features` array.
    pub async fn fetch_category(
        &self,
        category: Category,
        window: TimeWindow,
    ) -> Result<Vec<EventRecord>, AggregatorError> {
        let url = upstream_url(&self.base_url, category, window)?;
        log::debug!("Fetching {category} events: {url}");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AggregatorError::Status { status });
        }

        let body = resp.text().await?;
        let mut json: serde_json::Value = serde_json::from_str(&body)?;

        let features = match json.get_mut("features").map(serde_json::Value::take) {
            Some(serde_json::Value::Array(features)) => features,
            _ => return Err(AggregatorError::MissingFeatures),
        };

        Ok(normalize_features(features, category))
    }

    /// Fetches every category concurrently and combines the results.
    ///
    /// Waits for all requests to settle. Failures are logged and turned
    /// into empty contributions.
    pub async fn aggregate(&self, categories: &[Category], window: TimeWindow) -> Aggregation {
        log::info!(
            "Fetching events for categories: {} timeFilter: {window}",
            join_names(categories)
        );

        let results = join_all(
            categories
                .iter()
                .map(|&category| async move { (category, self.fetch_category(category, window).await) }),
        )
        .await;

        let mut events = Vec::new();
        let mut failed = Vec::new();

        for (category, result) in results {
            match result {
                Ok(records) => {
                    log::debug!("{category}: {} events", records.len());
                    events.extend(records);
                }
                Err(AggregatorError::MissingFeatures) => {
                    log::warn!("No features in GDELT response for {category}");
                    failed.push(category);
                }
                Err(e) => {
                    log::error!("Failed to fetch {category} events: {e}");
                    failed.push(category);
                }
            }
        }

        let has_errors = !failed.is_empty();
        log::info!(
            "Fetched {} total events{}",
            events.len(),
            if has_errors { " (with some errors)" } else { "" }
        );

        Aggregation {
            events,
            categories: categories.to_vec(),
            time_window: window,
            has_errors,
            failed,
        }
    }
}

fn join_names(categories: &[Category]) -> String {
    categories
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
