//! Derivation of the filtered view from the full event set.

use gdelt_pulse_event_models::EventRecord;

use crate::FilterState;

/// Applies the category and search predicates to `events`.
///
/// Both predicates must pass. Relative order is preserved. The time
/// window is not applied here; it only narrows the upstream query.
#[must_use]
pub fn filter_events(events: &[EventRecord], filter: &FilterState) -> Vec<EventRecord> {
    let query = if filter.search.trim().is_empty() {
        None
    } else {
        Some(filter.search.to_lowercase())
    };

    events
        .iter()
        .filter(|event| filter.category.matches(event.category))
        .filter(|event| query.as_deref().is_none_or(|q| matches_search(event, q)))
        .cloned()
        .collect()
}

/// `query` must already be lower-cased.
fn matches_search(event: &EventRecord, query: &str) -> bool {
    let contains = |field: Option<&str>| field.is_some_and(|s| s.to_lowercase().contains(query));

    contains(event.title.as_deref())
        || contains(event.domain.as_deref())
        || event.category.as_ref().to_lowercase().contains(query)
}
