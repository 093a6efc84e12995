//! Live terminal dashboard: store, poller, and a line-based command prompt.

use std::io::Write as _;
use std::sync::Arc;

use chrono::Utc;
use gdelt_pulse_event_models::{CategoryFilter, TimeWindow};
use gdelt_pulse_poller::{HttpEventsSource, Poller, PollerConfig};
use gdelt_pulse_store::{Action, FilterState, Store};
use tokio::sync::mpsc;

use crate::render::{draw_frame, render};

/// A line typed at the dashboard prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Category(CategoryFilter),
    Time(TimeWindow),
    Search(String),
    Reset,
    Refresh,
    Quit,
}

pub const HELP: &str =
    "c <all|conflict|protest|diplomacy|disaster>  t <1H|6H|12H|24H|3D|7D>  s [text]  x reset  r refresh  q quit";

/// Parses one prompt line.
///
/// # Errors
///
/// Returns a message naming the problem for unknown commands or values.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    match command {
        "c" => arg.parse().map(Input::Category).map_err(|e| e.to_string()),
        "t" => arg
            .parse()
            .map(Input::Time)
            .map_err(|_| format!("unknown time window '{arg}'")),
        "s" => Ok(Input::Search(arg.to_string())),
        "x" => Ok(Input::Reset),
        "r" => Ok(Input::Refresh),
        "q" => Ok(Input::Quit),
        _ => Err(format!("unknown command '{command}'")),
    }
}

/// Forwards stdin lines from a detached thread so a pending read never
/// holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Runs the dashboard until Ctrl-C, `q`, or end of input.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built, or if writing to
/// stdout or listening for Ctrl-C fails.
pub async fn run(config: PollerConfig, filter: FilterState) -> Result<(), Box<dyn std::error::Error>> {
    let source = Arc::new(HttpEventsSource::from_config(&config)?);
    let store = Store::with_filter(filter);
    let mut updates = store.subscribe();
    let poller = Poller::spawn(source, store.clone(), config);

    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    let mut notice: Option<String> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut stdout = std::io::stdout();

    loop {
        let state = updates.borrow_and_update().clone();
        draw_frame(&mut stdout, |frame| {
            render(frame, &state, Utc::now())?;
            writeln!(frame, "\n{HELP}")?;
            if let Some(notice) = &notice {
                writeln!(frame, "{notice}")?;
            }
            Ok(())
        })?;

        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.recv(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                notice = None;
                match parse_input(&line) {
                    Ok(Input::Category(category)) => store.dispatch(Action::SetCategory(category)),
                    Ok(Input::Time(window)) => store.dispatch(Action::SetTimeWindow(window)),
                    Ok(Input::Search(search)) => store.dispatch(Action::SetSearch(search)),
                    Ok(Input::Reset) => store.dispatch(Action::Reset),
                    Ok(Input::Refresh) => poller.refresh(),
                    Ok(Input::Quit) => break,
                    Err(message) => notice = Some(message),
                }
            }
        }
    }

    log::info!("Shutting down poller");
    poller.shutdown().await;
    Ok(())
}
