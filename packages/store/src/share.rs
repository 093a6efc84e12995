//! Share URLs: encode a [`FilterState`] as query parameters and back.
//!
//! Parameters are `category`, `time`, and `search`, each omitted when it
//! holds its default. Parsing is strict: an unknown category or time
//! window is an error rather than being passed through.

use gdelt_pulse_event_models::{CategoryFilter, TimeWindow};

use crate::FilterState;

/// Errors from parsing a share URL.
#[derive(Debug, thiserror::Error)]
pub enum ShareUrlError {
    #[error("unknown category '{value}'")]
    InvalidCategory {
        /// The rejected value.
        value: String,
    },

    #[error("unknown time window '{value}'")]
    InvalidTimeWindow {
        /// The rejected value.
        value: String,
    },

    /// A percent-escape decoded to invalid UTF-8.
    #[error("invalid percent-encoding: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Encodes the non-default parts of `filter` as a query string, without
/// the leading `?`.
#[must_use]
pub fn share_query(filter: &FilterState) -> String {
    let mut params = Vec::new();
    if filter.category != CategoryFilter::All {
        params.push(format!("category={}", filter.category));
    }
    if filter.time_window != TimeWindow::default() {
        params.push(format!("time={}", filter.time_window));
    }
    if !filter.search.is_empty() {
        params.push(format!("search={}", urlencoding::encode(&filter.search)));
    }
    params.join("&")
}

/// Appends [`share_query`] to `base` (origin plus path).
#[must_use]
pub fn share_url(base: &str, filter: &FilterState) -> String {
    let query = share_query(filter);
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// Parses a full share URL. Everything before `?` and after `#` is
/// ignored; a URL without a query yields the default filter.
///
/// # Errors
///
/// See [`parse_share_query`].
pub fn parse_share_url(url: &str) -> Result<FilterState, ShareUrlError> {
    let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
    match without_fragment.split_once('?') {
        Some((_, query)) => parse_share_query(query),
        None => Ok(FilterState::default()),
    }
}

/// Parses a query string (leading `?` optional) into a filter.
///
/// Unknown parameter names are ignored. Empty values are treated as
/// absent. When a name repeats, the first occurrence wins.
///
/// # Errors
///
/// Returns [`ShareUrlError`] for an unrecognized `category` or `time`
/// value, or for malformed percent-encoding.
pub fn parse_share_query(query: &str) -> Result<FilterState, ShareUrlError> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut category = None;
    let mut time = None;
    let mut search = None;

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let slot = match decode(key)?.as_str() {
            "category" => &mut category,
            "time" => &mut time,
            "search" => &mut search,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(decode(value)?);
        }
    }

    let mut filter = FilterState::default();

    if let Some(value) = category.filter(|v| !v.is_empty()) {
        filter.category = value
            .parse()
            .map_err(|_| ShareUrlError::InvalidCategory { value })?;
    }
    if let Some(value) = time.filter(|v| !v.is_empty()) {
        filter.time_window = value
            .parse()
            .map_err(|_| ShareUrlError::InvalidTimeWindow { value })?;
    }
    if let Some(value) = search {
        filter.search = value;
    }

    Ok(filter)
}

/// Form-style decoding: `+` is a space.
fn decode(raw: &str) -> Result<String, ShareUrlError> {
    let spaced = raw.replace('+', " ");
    Ok(urlencoding::decode(&spaced)?.into_owned())
}
