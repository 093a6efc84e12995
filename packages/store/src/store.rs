//! Observable wrapper around [`reduce`](crate::reduce).

use std::sync::Arc;

use tokio::sync::watch;

use crate::{Action, FilterState, StoreState, reduce};

/// Shared handle to the client state.
///
/// Cloning the store yields another handle to the same state. Each
/// [`dispatch`](Self::dispatch) publishes exactly one new snapshot, so
/// subscribers never observe a half-applied action.
#[derive(Debug, Clone)]
pub struct Store {
    tx: Arc<watch::Sender<Arc<StoreState>>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreState::default())
    }
}

impl Store {
    #[must_use]
    pub fn new(initial: StoreState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    /// A store with no events and `filter` pre-selected.
    #[must_use]
    pub fn with_filter(filter: FilterState) -> Self {
        Self::new(StoreState::with_filter(filter))
    }

    /// Applies `action` and notifies subscribers.
    pub fn dispatch(&self, action: Action) {
        log::trace!("dispatch {action:?}");
        self.tx.send_modify(|state| {
            *state = Arc::new(reduce(state, action));
        });
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<StoreState> {
        self.tx.borrow().clone()
    }

    /// A receiver that wakes on every dispatch.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreState>> {
        self.tx.subscribe()
    }
}
