use std::sync::Arc;

use arcstr::ArcStr;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopupEvent {
    /// All popups were closed.
    Closed,

    /// The popup of this venue is now the open one.
    Opened(ArcStr),
}

/// Keeps at most one venue popup open across all map views.
///
/// State changes happen under a lock and are published in the same critical section, so
/// the open id and the order of events always agree.
#[derive(Clone)]
pub struct PopupCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    open: Mutex<Option<ArcStr>>,
    events: broadcast::Sender<PopupEvent>,
}

impl PopupCoordinator {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        let inner = Inner { open: Mutex::new(None), events };
        Self { inner: Arc::new(inner) }
    }

    /// Opens the popup of `id`, closing any other one.
    ///
    /// Subscribers receive [PopupEvent::Closed] followed by [PopupEvent::Opened]. Does nothing
    /// if `id` is already open. Returns true if the state changed.
    pub fn open(&self, id: &ArcStr) -> bool {
        let mut open = self.inner.open.lock();
        if open.as_ref() == Some(id) {
            return false;
        }

        debug!("Open popup {}, replacing {:?}", id, open.as_deref());
        *open = Some(id.clone());

        self.publish(PopupEvent::Closed);
        self.publish(PopupEvent::Opened(id.clone()));
        true
    }

    /// Closes the popup of `id` if it is the open one.
    pub fn close(&self, id: &ArcStr) -> bool {
        let mut open = self.inner.open.lock();
        if open.as_ref() != Some(id) {
            return false;
        }

        debug!("Close popup {}", id);
        *open = None;

        self.publish(PopupEvent::Closed);
        true
    }

    /// Closes every popup. Subscribers are notified even if nothing was open.
    pub fn close_all(&self) {
        let mut open = self.inner.open.lock();
        *open = None;

        self.publish(PopupEvent::Closed);
    }

    pub fn get_open(&self) -> Option<ArcStr> {
        self.inner.open.lock().clone()
    }

    /// Receives all popup events from now on. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> broadcast::Receiver<PopupEvent> {
        self.inner.events.subscribe()
    }

    fn publish(&self, event: PopupEvent) {
        // sending only fails if nobody is listening
        let _ = self.inner.events.send(event);
    }
}

impl Default for PopupCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
