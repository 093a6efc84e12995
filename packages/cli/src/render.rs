//! Plain-text rendering of the store for the terminal.

use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use gdelt_pulse_event_models::{EventRecord, category_counts, format_time_ago};
use gdelt_pulse_store::StoreState;

/// Rows printed before the list is cut off.
pub const MAX_ROWS: usize = 40;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const FAILURE_SCREEN: &str = "\
Something went wrong while drawing the dashboard.
The view will be redrawn on the next update. Type r to reload now.
";

/// Writes one full dashboard frame for `state`.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn render(out: &mut impl Write, state: &StoreState, now: DateTime<Utc>) -> io::Result<()> {
    let filter = &state.filter;

    writeln!(out, "GDELT Pulse | last {}", filter.time_window.label())?;

    let stats: Vec<String> = category_counts(&state.events)
        .into_iter()
        .map(|(category, count)| format!("{} {} {count}", category.icon(), category.display_name()))
        .collect();
    writeln!(out, "{} | {} events", stats.join("  "), state.events.len())?;

    write!(out, "Filter: category={} time={}", filter.category, filter.time_window)?;
    if !filter.search.trim().is_empty() {
        write!(out, " search=\"{}\"", filter.search)?;
    }
    writeln!(out)?;

    if state.loading {
        writeln!(out, "Loading...")?;
    }
    if let Some(error) = &state.error {
        writeln!(out, "Error: {error}")?;
    }
    writeln!(out)?;

    if state.filtered.is_empty() {
        if !state.loading {
            writeln!(out, "No events match the current filters.")?;
        }
        return Ok(());
    }

    for event in state.filtered.iter().take(MAX_ROWS) {
        render_row(out, event, now)?;
    }
    if state.filtered.len() > MAX_ROWS {
        writeln!(out, "... and {} more", state.filtered.len() - MAX_ROWS)?;
    }
    writeln!(out, "\nShowing {} of {} events", state.filtered.len(), state.events.len())
}

fn render_row(out: &mut impl Write, event: &EventRecord, now: DateTime<Utc>) -> io::Result<()> {
    let category = event.category;
    write!(
        out,
        "{} {:<10} {:>5}  {}",
        category.icon(),
        category.display_name(),
        event.count,
        event.title.as_deref().unwrap_or("(untitled)")
    )?;
    if let Some(domain) = &event.domain {
        write!(out, "  [{domain}]")?;
    }
    if let Some(published) = event.published_at() {
        write!(out, "  {}", format_time_ago(published, now))?;
    }
    writeln!(out)
}

/// Draws a frame produced by `draw` onto `out`, clearing the screen first.
///
/// The frame is built in memory. If building it fails or panics, a generic
/// failure screen is shown instead and nothing partial reaches `out`.
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn draw_frame<F>(out: &mut impl Write, draw: F) -> io::Result<()>
where
    F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
{
    let mut frame = Vec::new();

    let body: &[u8] = match panic::catch_unwind(AssertUnwindSafe(|| draw(&mut frame))) {
        Ok(Ok(())) => &frame,
        Ok(Err(e)) => {
            log::error!("Render failed: {e}");
            FAILURE_SCREEN.as_bytes()
        }
        Err(_) => {
            log::error!("Render panicked");
            FAILURE_SCREEN.as_bytes()
        }
    };

    out.write_all(CLEAR_SCREEN.as_bytes())?;
    out.write_all(body)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone as _;
    use gdelt_pulse_event_models::{Category, CategoryFilter, TimeWindow};
    use gdelt_pulse_store::{Action, FilterState, reduce};
    use pretty_assertions::assert_eq;

    use super::*;

    fn event(category: Category, title: &str, date: Option<&str>) -> EventRecord {
        EventRecord {
            id: format!("{category}-0-{title}"),
            lat: 1.0,
            lng: 2.0,
            category,
            color: category.color().to_string(),
            title: Some(title.to_string()),
            count: 3,
            html: None,
            share_image: None,
            url: None,
            domain: Some("example.org".to_string()),
            date: date.map(ToString::to_string),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn to_string(state: &StoreState) -> String {
        let mut out = Vec::new();
        render(&mut out, state, now()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn renders_stats_and_filtered_rows() {
        let state = reduce(
            &StoreState::with_filter(FilterState {
                category: CategoryFilter::Only(Category::Protest),
                time_window: TimeWindow::SixHours,
                search: String::new(),
            }),
            Action::ReplaceEvents(vec![
                event(Category::Conflict, "Kyiv", None),
                event(Category::Protest, "Paris", Some("2024-05-01T09:30:00Z")),
            ]),
        );

        let text = to_string(&state);

        assert!(text.starts_with("GDELT Pulse | last 6 Hours\n"));
        assert!(text.contains("Conflict 1"));
        assert!(text.contains("Protest 1"));
        assert!(text.contains("Diplomacy 0"));
        assert!(text.contains("| 2 events"));
        assert!(text.contains("Filter: category=protest time=6H\n"));
        assert!(text.contains("Paris  [example.org]  2h ago"));
        assert!(!text.contains("Kyiv"));
        assert!(text.ends_with("Showing 1 of 2 events\n"));
    }

    #[test]
    fn shows_loading_error_and_empty_message() {
        let mut state = StoreState {
            loading: true,
            ..StoreState::default()
        };
        let text = to_string(&state);
        assert!(text.contains("Loading..."));
        assert!(!text.contains("No events match"));

        state.loading = false;
        state.error = Some("HTTP error! status: 502 Bad Gateway".to_string());
        let text = to_string(&state);
        assert!(text.contains("Error: HTTP error! status: 502 Bad Gateway"));
        assert!(text.contains("No events match the current filters."));
    }

    #[test]
    fn truncates_long_lists() {
        let events: Vec<EventRecord> = (0..MAX_ROWS + 5)
            .map(|i| event(Category::Disaster, &format!("quake {i}"), None))
            .collect();
        let state = StoreState {
            events: Arc::from(events.clone()),
            filtered: events,
            ..StoreState::default()
        };

        let text = to_string(&state);

        assert!(text.contains("... and 5 more"));
        assert!(text.contains(&format!("quake {}  [", MAX_ROWS - 1)));
        assert!(!text.contains(&format!("quake {MAX_ROWS}  [")));
    }

    #[test]
    fn frame_is_cleared_and_flushed() {
        let mut out = Vec::new();
        draw_frame(&mut out, |frame| frame.write_all(b"hello\n")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{CLEAR_SCREEN}hello\n"));
    }

    #[test]
    fn failed_render_shows_failure_screen() {
        let mut out = Vec::new();
        draw_frame(&mut out, |frame| {
            frame.write_all(b"partial")?;
            Err(io::Error::other("boom"))
        })
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{CLEAR_SCREEN}{FAILURE_SCREEN}"));
    }

    #[test]
    fn panicking_render_shows_failure_screen() {
        let mut out = Vec::new();
        draw_frame(&mut out, |_| panic!("bad frame")).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{CLEAR_SCREEN}{FAILURE_SCREEN}"));
    }
}
