#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client-side event filter store, share URLs, and JSON export.
//!
//! All state transitions are expressed as a pure [`reduce`] over
//! `(state, action)`. The [`Store`] wraps the reducer in a
//! `tokio::sync::watch` channel so any number of views can observe a
//! fully-updated snapshot after every dispatch.

pub mod export;
pub mod filter;
pub mod reducer;
pub mod share;
pub mod store;

use gdelt_pulse_event_models::{CategoryFilter, TimeWindow};
use serde::{Deserialize, Serialize};

pub use export::{ExportError, export_file_name, export_json, write_export};
pub use filter::filter_events;
pub use reducer::{Action, StoreState, reduce};
pub use share::{ShareUrlError, parse_share_query, parse_share_url, share_query, share_url};
pub use store::Store;

/// The user's current category, time window, and search selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub category: CategoryFilter,
    /// Only drives refetching; never applied client-side.
    pub time_window: TimeWindow,
    /// Free text, matched case-insensitively.
    pub search: String,
}
