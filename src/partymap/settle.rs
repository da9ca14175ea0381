use parking_lot::Mutex;
use tokio::sync::oneshot;

/// A slot that accepts exactly one value.
///
/// Any number of producers may race to [Settle::settle] the slot. Only the first one wins,
/// every later call is a no-op. The value is delivered to the receiver returned by
/// [Settle::new].
pub struct Settle<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Settle<T> {
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Self { sender: Mutex::new(Some(tx)) }, rx)
    }

    /// Settles with `value`. Returns false if the slot was already settled.
    pub fn settle(&self, value: T) -> bool {
        let Some(tx) = self.sender.lock().take() else {
            return false;
        };

        // a dropped receiver still counts as settled
        let _ = tx.send(value);
        true
    }

    #[cfg(test)]
    pub fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }
}
