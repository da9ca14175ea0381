use std::sync::Arc;

use arcstr::ArcStr;
use itertools::Itertools;
use tokio::sync::watch;
use tracing::debug;

/// Publishes the ids of the venues currently highlighted on the map.
///
/// There is exactly one current value. Subscribers always see the latest value but may miss
/// intermediate ones. Dropping a receiver unsubscribes it.
#[derive(Clone)]
pub struct HighlightChannel {
    tx: Arc<watch::Sender<Vec<ArcStr>>>,
}

impl HighlightChannel {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Vec::new());
        Self { tx: Arc::new(tx) }
    }

    /// Replaces the highlighted ids. Duplicates are dropped, the first occurrence keeps its place.
    pub fn set(&self, ids: &[ArcStr]) {
        let ids = ids.iter().unique().cloned().collect_vec();
        debug!("Highlight {} venues for {} subscribers", ids.len(), self.tx.receiver_count());
        self.tx.send_replace(ids);
    }

    pub fn clear(&self) {
        debug!("Clear highlight");
        self.tx.send_replace(Vec::new());
    }

    pub fn get(&self) -> Vec<ArcStr> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ArcStr>> {
        self.tx.subscribe()
    }
}

impl Default for HighlightChannel {
    fn default() -> Self {
        Self::new()
    }
}
