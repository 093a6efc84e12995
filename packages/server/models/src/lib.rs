#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the GDELT Pulse server.
//!
//! Shared by the server, which produces them, and the poller, which
//! consumes the events response.

use gdelt_pulse_event_models::{Category, EventRecord, TimeWindow};
use serde::{Deserialize, Serialize};

/// Query parameters for `GET /api/events`.
///
/// Values are kept as raw strings so the handler can reject unknown
/// windows and categories with a descriptive error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQueryParams {
    /// Lookback window key (`1H` .. `7D`). Defaults to `24H`.
    pub time_filter: Option<String>,
    /// Comma-separated list of category names. Defaults to all.
    pub categories: Option<String>,
}

/// Successful (possibly partial) response from `GET /api/events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsResponse {
    pub events: Vec<EventRecord>,
    /// Always `events.len()`.
    pub total_count: usize,
    pub time_filter: TimeWindow,
    /// Categories that were requested, in request order.
    pub categories: Vec<Category>,
    /// `true` when at least one category fetch failed.
    #[serde(default)]
    pub has_errors: bool,
}

/// Top-level failure body. Always carries an empty event list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Short summary.
    pub error: String,
    /// Detail for logs and banners.
    pub message: String,
    pub events: Vec<EventRecord>,
    pub total_count: usize,
}

impl ApiErrorResponse {
    /// Builds an error body with no events.
    #[must_use]
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            events: Vec::new(),
            total_count: 0,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// One entry of the category table served by `GET /api/categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    pub key: Category,
    pub name: String,
    pub color: String,
    pub icon: String,
    /// Upstream keyword query.
    pub query: String,
}

impl From<Category> for ApiCategory {
    fn from(category: Category) -> Self {
        Self {
            key: category,
            name: category.display_name().to_string(),
            color: category.color().to_string(),
            icon: category.icon().to_string(),
            query: category.query().to_string(),
        }
    }
}

/// One entry of the time window table served by `GET /api/time-windows`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTimeWindow {
    pub key: TimeWindow,
    pub hours: u32,
    pub label: String,
}

impl From<TimeWindow> for ApiTimeWindow {
    fn from(window: TimeWindow) -> Self {
        Self {
            key: window,
            hours: window.hours(),
            label: window.label().to_string(),
        }
    }
}
