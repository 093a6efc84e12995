//! The background polling task and its handle.

use std::collections::HashMap;
use std::sync::Arc;

use gdelt_pulse_event_models::{EventRecord, TimeWindow};
use gdelt_pulse_store::{Action, Store};
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{EventsSource, PollerConfig, fetch_with_retry};

/// Why a fetch cycle is starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// Startup or refresh interval.
    Tick,
    WindowChanged,
    /// User-requested; skips de-duplication.
    Manual,
}

/// Last successful response per window.
struct CachedResponse {
    fetched_at: Instant,
    events: Vec<EventRecord>,
}

/// Spawns polling tasks.
pub struct Poller;

impl Poller {
    /// Starts polling `source` into `store`.
    ///
    /// Must be called from within a Tokio runtime. The first fetch
    /// happens immediately, for the store's current time window.
    #[must_use]
    pub fn spawn(source: Arc<dyn EventsSource>, store: Store, config: PollerConfig) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let refresh = Arc::new(Notify::new());

        let task = tokio::spawn(run(source, store, config, Arc::clone(&refresh), shutdown_rx));

        PollerHandle {
            refresh,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

/// Controls a running poller. Dropping the handle stops the task.
pub struct PollerHandle {
    refresh: Arc<Notify>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Requests an immediate refetch, bypassing de-duplication.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Stops the task, abandoning any in-flight request, and waits for it
    /// to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            log::error!("Poller task failed: {e}");
        }
    }
}

async fn run(
    source: Arc<dyn EventsSource>,
    store: Store,
    config: PollerConfig,
    refresh: Arc<Notify>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut changes = store.subscribe();
    let mut window = store.state().filter.time_window;
    let mut cache: HashMap<TimeWindow, CachedResponse> = HashMap::new();

    let period = if config.refresh_interval.is_zero() {
        let fallback = PollerConfig::default().refresh_interval;
        log::error!("Refresh interval is zero, polling every {fallback:?} instead");
        fallback
    } else {
        config.refresh_interval
    };
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log::info!(
        "Polling {} every {period:?} (window {window})",
        config.endpoint
    );

    loop {
        let trigger = tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => Trigger::Tick,
            () = refresh.notified() => Trigger::Manual,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let selected = changes.borrow_and_update().filter.time_window;
                if selected == window {
                    continue;
                }
                window = selected;
                Trigger::WindowChanged
            }
        };

        if trigger != Trigger::Manual
            && let Some(cached) = cache.get(&window)
            && cached.fetched_at.elapsed() < config.dedupe_interval
        {
            log::debug!("{window} fetched {:?} ago, reusing response", cached.fetched_at.elapsed());
            if trigger == Trigger::WindowChanged {
                store.dispatch(Action::ReplaceEvents(cached.events.clone()));
            }
            continue;
        }

        log::debug!("Fetching {window} ({trigger:?})");
        store.dispatch(Action::SetLoading(true));

        let result = tokio::select! {
            _ = &mut shutdown => break,
            result = fetch_with_retry(source.as_ref(), window, config.retry_count, config.retry_interval) => result,
        };

        match result {
            Ok(response) => {
                if response.has_errors {
                    log::warn!("Partial data for {window}: some categories failed upstream");
                }
                log::info!("Received {} events for {window}", response.total_count);
                cache.insert(
                    window,
                    CachedResponse {
                        fetched_at: Instant::now(),
                        events: response.events.clone(),
                    },
                );
                store.dispatch(Action::ReplaceEvents(response.events));
                store.dispatch(Action::SetError(None));
            }
            Err(e) => {
                log::error!("Events fetch error: {e}");
                store.dispatch(Action::SetError(Some(e.to_string())));
            }
        }
        // Next scheduled refresh is one full period after this fetch.
        ticker.reset();
        store.dispatch(Action::SetLoading(false));
    }

    log::debug!("Poller stopped");
}
