#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Event category, time window, and normalized event record types.
//!
//! This crate defines the fixed category and lookback tables shared by the
//! aggregator, the API server, the filter store, and the terminal front end.
//! Every upstream feature is normalized into a single [`EventRecord`] shape
//! regardless of which GDELT response flavour it came from.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Top-level event classifications.
///
/// Each variant carries a static upstream keyword query plus the display
/// attributes used by the front end.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Armed conflict, attacks, military activity
    Conflict,
    /// Protests, demonstrations, riots, marches
    Protest,
    /// Treaties, summits, negotiations
    Diplomacy,
    /// Natural disasters and emergencies
    Disaster,
}

impl Category {
    /// Returns all variants of this enum, in request order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Conflict, Self::Protest, Self::Diplomacy, Self::Disaster]
    }

    /// Boolean keyword query sent to the upstream API for this category.
    #[must_use]
    pub const fn query(self) -> &'static str {
        match self {
            Self::Conflict => "conflict OR war OR attack OR violence OR military",
            Self::Protest => "protest OR demonstration OR riot OR march",
            Self::Diplomacy => "diplomacy OR treaty OR summit OR negotiation OR agreement",
            Self::Disaster => "earthquake OR flood OR hurricane OR disaster OR emergency",
        }
    }

    /// Hex display color.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Conflict => "#ef4444",
            Self::Protest => "#eab308",
            Self::Diplomacy => "#3b82f6",
            Self::Disaster => "#22c55e",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Conflict => "Conflict",
            Self::Protest => "Protest",
            Self::Diplomacy => "Diplomacy",
            Self::Disaster => "Disaster",
        }
    }

    /// Emoji shown next to the category name.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Conflict => "\u{2694}\u{fe0f}",
            Self::Protest => "\u{270a}",
            Self::Diplomacy => "\u{1f91d}",
            Self::Disaster => "\u{1f32a}\u{fe0f}",
        }
    }
}

/// Fixed lookback spans used to bound the upstream query.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum TimeWindow {
    #[serde(rename = "1H")]
    #[strum(serialize = "1H")]
    OneHour,
    #[serde(rename = "6H")]
    #[strum(serialize = "6H")]
    SixHours,
    #[serde(rename = "12H")]
    #[strum(serialize = "12H")]
    TwelveHours,
    #[default]
    #[serde(rename = "24H")]
    #[strum(serialize = "24H")]
    TwentyFourHours,
    #[serde(rename = "3D")]
    #[strum(serialize = "3D")]
    ThreeDays,
    #[serde(rename = "7D")]
    #[strum(serialize = "7D")]
    SevenDays,
}

impl TimeWindow {
    /// Returns all variants of this enum, shortest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::OneHour,
            Self::SixHours,
            Self::TwelveHours,
            Self::TwentyFourHours,
            Self::ThreeDays,
            Self::SevenDays,
        ]
    }

    /// Number of hours covered by this window.
    #[must_use]
    pub const fn hours(self) -> u32 {
        match self {
            Self::OneHour => 1,
            Self::SixHours => 6,
            Self::TwelveHours => 12,
            Self::TwentyFourHours => 24,
            Self::ThreeDays => 72,
            Self::SevenDays => 168,
        }
    }

    /// Human-readable span, e.g. `"3 Days"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneHour => "1 Hour",
            Self::SixHours => "6 Hours",
            Self::TwelveHours => "12 Hours",
            Self::TwentyFourHours => "24 Hours",
            Self::ThreeDays => "3 Days",
            Self::SevenDays => "7 Days",
        }
    }

    /// Upstream `timespan` parameter value (e.g. `"72h"`).
    #[must_use]
    pub fn timespan(self) -> String {
        format!("{}h", self.hours())
    }
}

/// Category selection: every category, or exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Returns `true` if `category` passes this filter.
    #[must_use]
    pub fn matches(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => write!(f, "{category}"),
        }
    }
}

/// Error returned when a string names neither `"all"` nor a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category '{value}'")]
pub struct ParseCategoryFilterError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for CategoryFilter {
    type Err = ParseCategoryFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse::<Category>()
            .map(Self::Only)
            .map_err(|_| ParseCategoryFilterError {
                value: s.to_string(),
            })
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        filter.to_string()
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = ParseCategoryFilterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for CategoryFilter {
    fn from(category: Category) -> Self {
        Self::Only(category)
    }
}

/// A normalized, category-tagged geographic point.
///
/// Records are rebuilt from scratch on every fetch; `id` is only stable
/// within a single response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// `<category>-<index>-<title>`.
    pub id: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Category whose query produced this record.
    pub category: Category,
    /// Display color, always [`Category::color`] of `category`.
    pub color: String,
    /// Headline or location name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Number of articles mentioning this location.
    pub count: u64,
    /// Upstream HTML snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Preview image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_image: Option<String>,
    /// Source article URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Publishing domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Publication timestamp as reported upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventRecord {
    /// Parses [`Self::date`], accepting RFC 3339 and GDELT's compact
    /// `YYYYMMDDTHHMMSSZ` form.
    #[must_use]
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.date.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%SZ")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Per-category event counts in [`Category::all`] order, zeros included.
#[must_use]
pub fn category_counts(events: &[EventRecord]) -> Vec<(Category, usize)> {
    Category::all()
        .iter()
        .map(|&category| {
            let count = events.iter().filter(|e| e.category == category).count();
            (category, count)
        })
        .collect()
}

/// Formats the distance between `then` and `now` as `"5m ago"`, `"3h ago"`,
/// or `"2d ago"`. Timestamps in the future read as `"0m ago"`.
#[must_use]
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes().max(0);
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        format!("{days}d ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    fn record(category: Category, title: Option<&str>) -> EventRecord {
        EventRecord {
            id: format!("{category}-0-x"),
            lat: 0.0,
            lng: 0.0,
            category,
            color: category.color().to_string(),
            title: title.map(String::from),
            count: 1,
            html: None,
            share_image: None,
            url: None,
            domain: None,
            date: None,
        }
    }

    #[test]
    fn category_strings_roundtrip() {
        for category in Category::all() {
            let parsed: Category = category.to_string().parse().unwrap();
            assert_eq!(parsed, *category);
        }
        assert!("Conflict".parse::<Category>().is_err());
        assert!("weather".parse::<Category>().is_err());
    }

    #[test]
    fn parse_errors_are_std_errors() {
        let category: Box<dyn std::error::Error + Send + Sync> =
            Box::new("weather".parse::<Category>().unwrap_err());
        let window: Box<dyn std::error::Error + Send + Sync> =
            Box::new("2H".parse::<TimeWindow>().unwrap_err());
        assert_eq!(category.to_string(), "Matching variant not found");
        assert_eq!(window.to_string(), "Matching variant not found");
    }

    #[test]
    fn time_window_hours_and_keys() {
        let expected = [
            ("1H", 1),
            ("6H", 6),
            ("12H", 12),
            ("24H", 24),
            ("3D", 72),
            ("7D", 168),
        ];
        for (window, (key, hours)) in TimeWindow::all().iter().zip(expected) {
            assert_eq!(window.to_string(), key);
            assert_eq!(window.hours(), hours);
            assert_eq!(key.parse::<TimeWindow>().unwrap(), *window);
        }
        assert_eq!(TimeWindow::default(), TimeWindow::TwentyFourHours);
        assert_eq!(TimeWindow::ThreeDays.timespan(), "72h");
        assert!("2D".parse::<TimeWindow>().is_err());
        assert!("24h".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn category_filter_parsing_is_strict() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "protest".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Protest)
        );
        let err = "ALL".parse::<CategoryFilter>().unwrap_err();
        assert_eq!(err.value, "ALL");
        assert!("".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn category_filter_serializes_as_plain_string() {
        let json = serde_json::to_string(&CategoryFilter::Only(Category::Disaster)).unwrap();
        assert_eq!(json, "\"disaster\"");
        let back: CategoryFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(back, CategoryFilter::All);
        assert!(serde_json::from_str::<CategoryFilter>("\"storm\"").is_err());
    }

    #[test]
    fn absent_optionals_are_omitted_from_json() {
        let json = serde_json::to_value(record(Category::Conflict, None)).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("title"));
        assert!(!obj.contains_key("domain"));
        assert_eq!(obj["category"], "conflict");
        assert_eq!(obj["color"], "#ef4444");
    }

    #[test]
    fn counts_include_empty_categories() {
        let events = vec![
            record(Category::Conflict, Some("a")),
            record(Category::Conflict, Some("b")),
            record(Category::Disaster, Some("c")),
        ];
        assert_eq!(
            category_counts(&events),
            vec![
                (Category::Conflict, 2),
                (Category::Protest, 0),
                (Category::Diplomacy, 0),
                (Category::Disaster, 1),
            ]
        );
    }

    #[test]
    fn time_ago_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(format_time_ago(now - chrono::Duration::minutes(5), now), "5m ago");
        assert_eq!(format_time_ago(now - chrono::Duration::minutes(59), now), "59m ago");
        assert_eq!(format_time_ago(now - chrono::Duration::hours(3), now), "3h ago");
        assert_eq!(format_time_ago(now - chrono::Duration::hours(50), now), "2d ago");
        assert_eq!(format_time_ago(now + chrono::Duration::hours(1), now), "0m ago");
    }

    #[test]
    fn parses_both_date_forms() {
        let mut event = record(Category::Protest, None);
        event.date = Some("20240510T113000Z".to_string());
        let compact = event.published_at().unwrap();
        event.date = Some("2024-05-10T11:30:00Z".to_string());
        assert_eq!(event.published_at().unwrap(), compact);
        event.date = Some("yesterday".to_string());
        assert!(event.published_at().is_none());
    }
}
