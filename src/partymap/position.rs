use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use partymap_geo::Coordinate;
use tokio::sync::watch;

/// Why a position could not be acquired. Always recovered by falling back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("permission to read the position was denied")]
    PermissionDenied,

    #[error("position is unavailable")]
    Unavailable,

    #[error("position request timed out")]
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout: Duration,

    /// The provider may answer with a reading that is at most this old.
    pub max_cached_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(1500),
            max_cached_age: Duration::from_millis(600_000),
        }
    }
}

/// A source for the current position of the user.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Returns false if positioning is not supported at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Reads the current position once.
    async fn current_position(&self, options: PositionOptions) -> Result<Coordinate, PositionError>;

    /// Continuous position updates, if the provider supports them.
    fn watch(&self) -> Option<watch::Receiver<Coordinate>> {
        None
    }
}

/// A provider that always answers with the same, known position.
#[derive(Clone, Debug)]
pub struct FixedPosition(pub Coordinate);

#[async_trait]
impl PositionProvider for FixedPosition {
    async fn current_position(&self, _options: PositionOptions) -> Result<Coordinate, PositionError> {
        Ok(self.0)
    }
}

/// No positioning support.
#[derive(Clone, Debug)]
pub struct NoPosition;

#[async_trait]
impl PositionProvider for NoPosition {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self, _options: PositionOptions) -> Result<Coordinate, PositionError> {
        Err(PositionError::Unavailable)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UserPosition {
    pub coordinate: Coordinate,
    pub observed_at: DateTime<Utc>,
}

impl UserPosition {
    pub fn observed_at_millis(&self) -> i64 {
        self.observed_at.timestamp_millis()
    }

    /// A position is fresh if it was observed at most `window` before `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let age = now.timestamp_millis() - self.observed_at_millis();
        age <= i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// The last known position of the user, shared by everyone resolving nearby venues.
#[derive(Clone)]
pub struct PositionCache {
    last: Arc<Mutex<Option<UserPosition>>>,
    freshness: Duration,
}

impl PositionCache {
    pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(120);

    pub fn new(freshness: Duration) -> Self {
        Self { last: Arc::new(Mutex::new(None)), freshness }
    }

    /// Remembers `coordinate` as observed right now.
    pub fn store(&self, coordinate: Coordinate) {
        self.store_at(coordinate, Utc::now());
    }

    pub fn store_at(&self, coordinate: Coordinate, observed_at: DateTime<Utc>) {
        *self.last.lock() = Some(UserPosition { coordinate, observed_at });
    }

    pub fn last(&self) -> Option<UserPosition> {
        *self.last.lock()
    }

    /// The last position if it is still fresh at `now`.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<UserPosition> {
        self.last().filter(|position| position.is_fresh(now, self.freshness))
    }
}

impl Default for PositionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FRESHNESS)
    }
}
