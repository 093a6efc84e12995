//! Pure state transitions for the filter store.

use std::sync::Arc;

use gdelt_pulse_event_models::{CategoryFilter, EventRecord, TimeWindow};

use crate::{FilterState, filter_events};

/// Complete client state: the last fetched events, the user's filter,
/// and the view derived from both.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreState {
    /// Every event from the last successful fetch. Replaced wholesale.
    pub events: Arc<[EventRecord]>,
    pub filter: FilterState,
    /// Always `filter_events(&events, &filter)`.
    pub filtered: Vec<EventRecord>,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Last fetch failure, cleared on the next success.
    pub error: Option<String>,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            events: Arc::from(Vec::new()),
            filter: FilterState::default(),
            filtered: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl StoreState {
    /// An empty state with `filter` already selected.
    #[must_use]
    pub fn with_filter(filter: FilterState) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }
}

/// Every mutation the store accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Swap in a freshly fetched event set.
    ReplaceEvents(Vec<EventRecord>),
    SetCategory(CategoryFilter),
    /// Changes which window the next fetch asks for.
    SetTimeWindow(TimeWindow),
    SetSearch(String),
    /// Replace the whole filter at once, e.g. from a share URL.
    SetFilter(FilterState),
    /// Back to all categories, empty search, 24H.
    Reset,
    SetLoading(bool),
    SetError(Option<String>),
}

/// Applies `action` to `state`, returning the next state.
///
/// The filtered view is recomputed whenever the events, category, or
/// search change.
#[must_use]
pub fn reduce(state: &StoreState, action: Action) -> StoreState {
    let mut next = state.clone();

    let refilter = match action {
        Action::ReplaceEvents(events) => {
            next.events = Arc::from(events);
            true
        }
        Action::SetCategory(category) => {
            next.filter.category = category;
            true
        }
        Action::SetTimeWindow(window) => {
            next.filter.time_window = window;
            false
        }
        Action::SetSearch(search) => {
            next.filter.search = search;
            true
        }
        Action::SetFilter(filter) => {
            next.filter = filter;
            true
        }
        Action::Reset => {
            next.filter = FilterState::default();
            true
        }
        Action::SetLoading(loading) => {
            next.loading = loading;
            false
        }
        Action::SetError(error) => {
            next.error = error;
            false
        }
    };

    if refilter {
        next.filtered = filter_events(&next.events, &next.filter);
    }

    next
}

#[cfg(test)]
mod tests {
    use gdelt_pulse_event_models::Category;
    use pretty_assertions::assert_eq;

    use super::*;

    fn event(id: &str, category: Category, title: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            lat: 1.0,
            lng: 2.0,
            category,
            color: category.color().to_string(),
            title: Some(title.to_string()),
            count: 1,
            html: None,
            share_image: None,
            url: None,
            domain: None,
            date: None,
        }
    }

    fn loaded() -> StoreState {
        reduce(
            &StoreState::default(),
            Action::ReplaceEvents(vec![
                event("c", Category::Conflict, "Border clash"),
                event("p", Category::Protest, "March downtown"),
            ]),
        )
    }

    #[test]
    fn replace_events_recomputes_view() {
        let state = loaded();
        assert_eq!(state.events.len(), 2);
        assert_eq!(state.filtered, state.events.to_vec());
    }

    #[test]
    fn category_then_search_example() {
        let state = reduce(&loaded(), Action::SetCategory(Category::Protest.into()));
        assert_eq!(state.filtered, vec![event("p", Category::Protest, "March downtown")]);

        let state = reduce(&state, Action::SetSearch("clash".to_string()));
        assert!(state.filtered.is_empty());
    }

    #[test]
    fn set_category_is_idempotent() {
        let once = reduce(&loaded(), Action::SetCategory(Category::Conflict.into()));
        let twice = reduce(&once, Action::SetCategory(Category::Conflict.into()));
        assert_eq!(once, twice);
    }

    #[test]
    fn replacing_events_keeps_filter() {
        let state = reduce(&loaded(), Action::SetCategory(Category::Conflict.into()));
        let state = reduce(
            &state,
            Action::ReplaceEvents(vec![
                event("p2", Category::Protest, "Sit-in"),
                event("c2", Category::Conflict, "Shelling"),
            ]),
        );
        assert_eq!(state.filtered, vec![event("c2", Category::Conflict, "Shelling")]);
    }

    #[test]
    fn time_window_does_not_filter() {
        let state = reduce(&loaded(), Action::SetTimeWindow(TimeWindow::OneHour));
        assert_eq!(state.filter.time_window, TimeWindow::OneHour);
        assert_eq!(state.filtered.len(), 2);
    }

    #[test]
    fn reset_restores_defaults_and_full_view() {
        let mut state = loaded();
        for action in [
            Action::SetCategory(Category::Protest.into()),
            Action::SetSearch("nothing matches".to_string()),
            Action::SetTimeWindow(TimeWindow::SevenDays),
        ] {
            state = reduce(&state, action);
        }
        assert!(state.filtered.is_empty());

        let state = reduce(&state, Action::Reset);
        assert_eq!(state.filter, FilterState::default());
        assert_eq!(state.filtered, state.events.to_vec());
    }

    #[test]
    fn loading_and_error_leave_view_alone() {
        let state = reduce(&loaded(), Action::SetLoading(true));
        let state = reduce(&state, Action::SetError(Some("HTTP 500".to_string())));
        assert!(state.loading);
        assert_eq!(state.error.as_deref(), Some("HTTP 500"));
        assert_eq!(state.filtered.len(), 2);
    }

    #[test]
    fn filtered_is_subset_of_events() {
        let mut state = loaded();
        for action in [
            Action::SetSearch("m".to_string()),
            Action::SetCategory(Category::Protest.into()),
            Action::ReplaceEvents(vec![event("x", Category::Protest, "Mass march")]),
            Action::Reset,
        ] {
            state = reduce(&state, action);
            assert!(state.filtered.iter().all(|e| state.events.contains(e)));
        }
    }
}
