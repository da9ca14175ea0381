use tracing::info;

/// Notice shown when a nearby search yields nothing.
pub const NO_RESULTS_NOTICE: &str = "No venues found nearby";

/// Receives short, user facing notices (toasts).
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes notices to the log.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("Notice: {}", message);
    }
}
