use std::sync::Arc;

use shared::protocol::ReaderEvent;
use tokio::sync::watch;

use crate::{
    reducer,
    state::{ReaderState, StateUpdate},
};

/// Owner of the current [`ReaderState`] snapshot.
///
/// Every change replaces the whole snapshot and is published to watchers.
pub struct StateStore {
    current: Arc<ReaderState>,
    publisher: watch::Sender<Arc<ReaderState>>,
}

impl StateStore {
    pub fn new(initial: ReaderState) -> Self {
        let current = Arc::new(initial);
        let (publisher, _) = watch::channel(Arc::clone(&current));
        Self { current, publisher }
    }

    pub fn snapshot(&self) -> Arc<ReaderState> {
        Arc::clone(&self.current)
    }

    pub fn state(&self) -> &ReaderState {
        &self.current
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ReaderState>> {
        self.publisher.subscribe()
    }

    /// Runs `event` through the reducer. Returns whether the snapshot changed.
    pub fn apply_event(&mut self, event: &ReaderEvent) -> bool {
        let next = reducer::reduce(&self.current, event);
        self.replace(next)
    }

    pub fn apply_update(&mut self, update: StateUpdate) {
        let next = Arc::new(self.current.with(update));
        self.replace(next);
    }

    fn replace(&mut self, next: Arc<ReaderState>) -> bool {
        if Arc::ptr_eq(&self.current, &next) {
            return false;
        }
        self.current = Arc::clone(&next);
        self.publisher.send_replace(next);
        true
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(ReaderState::default())
    }
}
