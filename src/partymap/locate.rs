use std::sync::Arc;
use std::time::Duration;

use arcstr::ArcStr;
use chrono::Utc;
use partymap_geo::{find_fallback, find_nearby, Coordinate, Venue};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, instrument};

use crate::partymap::highlight::HighlightChannel;
use crate::partymap::notify::{Notifier, NO_RESULTS_NOTICE};
use crate::partymap::popup::PopupCoordinator;
use crate::partymap::position::{PositionCache, PositionError, PositionOptions, PositionProvider};
use crate::partymap::settle::Settle;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocateOptions {
    /// Time the live position gets before the fallback takes over.
    pub fallback_delay: Duration,
    pub position: PositionOptions,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            fallback_delay: Duration::from_millis(500),
            position: PositionOptions::default(),
        }
    }
}

/// Where the coordinate used for a resolution came from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Origin {
    Cached(Coordinate),
    Live(Coordinate),

    /// No usable position, the densest city was used instead.
    Fallback,
}

#[derive(Debug)]
enum Outcome {
    Live(Coordinate),
    Failed(PositionError),
    TimedOut,
}

/// Resolves the venues near the user and publishes them to the map.
#[derive(Clone)]
pub struct Locator {
    provider: Arc<dyn PositionProvider>,
    cache: PositionCache,
    highlights: HighlightChannel,
    popups: PopupCoordinator,
    notifier: Arc<dyn Notifier>,
    options: LocateOptions,
}

impl Locator {
    pub fn new(
        provider: Arc<dyn PositionProvider>,
        cache: PositionCache,
        highlights: HighlightChannel,
        popups: PopupCoordinator,
        notifier: Arc<dyn Notifier>,
        options: LocateOptions,
    ) -> Self {
        Self { provider, cache, highlights, popups, notifier, options }
    }

    #[cfg(test)]
    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    /// Finds the venues near the user, highlights them and closes any open popup.
    ///
    /// A fresh cached position is used without waiting. Otherwise the live position races
    /// against the fallback delay and whichever finishes first decides the result. An empty
    /// result is reported to the notifier and leaves highlight and popups untouched.
    #[instrument(skip_all, fields(venues = venues.len()))]
    pub async fn resolve<V: Venue>(&self, venues: &[V]) -> Vec<ArcStr> {
        let origin = self.locate().await;

        let ids = match origin {
            Origin::Cached(user) | Origin::Live(user) => find_nearby(user, venues),
            Origin::Fallback => find_fallback(venues),
        };

        info!("Resolved {} nearby venues from {:?}", ids.len(), origin);
        self.publish(&ids);
        ids
    }

    /// Like [Locator::resolve], for a position the caller already knows.
    ///
    /// The position is remembered as the latest user position afterwards.
    #[instrument(skip_all, fields(venues = venues.len()))]
    pub fn resolve_at<V: Venue>(&self, user: Coordinate, venues: &[V]) -> Vec<ArcStr> {
        let ids = find_nearby(user, venues);

        info!("Resolved {} nearby venues around {:?}", ids.len(), user);
        self.publish(&ids);
        self.cache.store(user);
        ids
    }

    /// Determines the coordinate to resolve from. Never fails, the worst case is [Origin::Fallback].
    pub async fn locate(&self) -> Origin {
        if let Some(position) = self.cache.fresh(Utc::now()) {
            debug!("Using cached position observed at {}", position.observed_at);
            self.cache.store(position.coordinate);
            return Origin::Cached(position.coordinate);
        }

        if !self.provider.is_available() {
            debug!("No position provider available");
            return Origin::Fallback;
        }

        match self.race().await {
            Outcome::Live(coordinate) => Origin::Live(coordinate),

            Outcome::Failed(err) => {
                debug!("Live position failed: {}", err);
                Origin::Fallback
            }

            Outcome::TimedOut => {
                debug!("No live position after {:?}", self.options.fallback_delay);
                Origin::Fallback
            }
        }
    }

    async fn race(&self) -> Outcome {
        let (settle, rx) = Settle::new();
        let settle = Arc::new(settle);

        // keeps running after losing, a late position still refreshes the cache
        tokio::spawn({
            let provider = self.provider.clone();
            let cache = self.cache.clone();
            let settle = settle.clone();
            let options = self.options.position.clone();

            async move {
                let request = provider.current_position(options.clone());
                let result = time::timeout(options.timeout, request)
                    .await
                    .unwrap_or(Err(PositionError::Timeout));

                let outcome = match result {
                    Ok(coordinate) => {
                        cache.store(coordinate);
                        Outcome::Live(coordinate)
                    }

                    Err(err) => Outcome::Failed(err),
                };

                if !settle.settle(outcome) {
                    debug!("Live position arrived after the fallback, ignoring it");
                }
            }
        });

        let timer = tokio::spawn({
            let settle = settle.clone();
            let delay = self.options.fallback_delay;

            async move {
                time::sleep(delay).await;
                settle.settle(Outcome::TimedOut);
            }
        });

        let outcome = rx.await.unwrap_or(Outcome::TimedOut);
        timer.abort();

        outcome
    }

    fn publish(&self, ids: &[ArcStr]) {
        if ids.is_empty() {
            self.notifier.notify(NO_RESULTS_NOTICE);
            return;
        }

        self.highlights.set(ids);
        self.popups.close_all();
    }

    /// Copies continuous position updates of the provider into the cache.
    ///
    /// Returns None if the provider does not support watching.
    pub fn track(&self) -> Option<JoinHandle<()>> {
        let mut updates = self.provider.watch()?;
        let cache = self.cache.clone();

        let handle = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let coordinate = *updates.borrow_and_update();
                debug!("Position update {:?}", coordinate);
                cache.store(coordinate);
            }

            debug!("Position updates ended");
        });

        Some(handle)
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use arcstr::ArcStr;
    use async_trait::async_trait;
    use chrono::{TimeDelta, Utc};
    use partymap_geo::{find_fallback, find_nearby, viewport_for, Coordinate, Viewport};
    use tokio::sync::{broadcast, watch};
    use tokio::time::Instant;

    use crate::partymap::highlight::HighlightChannel;
    use crate::partymap::locate::{LocateOptions, Locator, Origin};
    use crate::partymap::notify::testing::NoticeLog;
    use crate::partymap::notify::NO_RESULTS_NOTICE;
    use crate::partymap::popup::{PopupCoordinator, PopupEvent};
    use crate::partymap::position::{NoPosition, PositionCache, PositionError, PositionOptions, PositionProvider};
    use crate::partymap::testing::budapest_and_szeged;
    use crate::partymap::Place;

    const HOME: Coordinate = Coordinate { lat: 47.50, lng: 19.05 };
    const SZEGED: Coordinate = Coordinate { lat: 46.2530, lng: 20.1414 };

    /// Answers after a fixed delay, or never.
    struct Scripted {
        delay: Option<Duration>,
        result: Result<Coordinate, PositionError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(delay_ms: u64, result: Result<Coordinate, PositionError>) -> Arc<Self> {
            let delay = Some(Duration::from_millis(delay_ms));
            Arc::new(Self { delay, result, calls: AtomicUsize::new(0) })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(Self { delay: None, result: Err(PositionError::Unavailable), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PositionProvider for Scripted {
        async fn current_position(&self, _options: PositionOptions) -> Result<Coordinate, PositionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            match self.delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending().await,
            }

            self.result.clone()
        }
    }

    struct Watching {
        updates: watch::Sender<Coordinate>,
    }

    #[async_trait]
    impl PositionProvider for Watching {
        async fn current_position(&self, _options: PositionOptions) -> Result<Coordinate, PositionError> {
            Ok(*self.updates.borrow())
        }

        fn watch(&self) -> Option<watch::Receiver<Coordinate>> {
            Some(self.updates.subscribe())
        }
    }

    struct Fixture {
        locator: Locator,
        notices: Arc<NoticeLog>,
        popup_events: broadcast::Receiver<PopupEvent>,
    }

    impl Fixture {
        fn new(provider: Arc<dyn PositionProvider>) -> Self {
            Self::with_options(provider, LocateOptions::default())
        }

        fn with_options(provider: Arc<dyn PositionProvider>, options: LocateOptions) -> Self {
            let notices = Arc::new(NoticeLog::default());
            let popups = PopupCoordinator::new();
            let popup_events = popups.subscribe();

            let locator = Locator::new(
                provider,
                PositionCache::default(),
                HighlightChannel::new(),
                popups,
                notices.clone(),
                options,
            );

            Self { locator, notices, popup_events }
        }

        fn highlighted(&self) -> Vec<ArcStr> {
            self.locator.highlights.get()
        }

        fn popup_events(&mut self) -> Vec<PopupEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.popup_events.try_recv() {
                events.push(event);
            }

            events
        }
    }

    fn as_str(ids: &[ArcStr]) -> Vec<&str> {
        ids.iter().map(|id| id.as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn live_position_in_budapest() {
        let venues = budapest_and_szeged();
        let provider = Scripted::new(0, Ok(HOME));
        let mut fixture = Fixture::new(provider.clone());

        let started = Instant::now();
        let ids = fixture.locator.resolve(&venues).await;

        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(as_str(&ids), vec!["b1", "b5", "b2", "b4", "b3"]);
        assert_eq!(fixture.highlighted(), ids);
        assert_eq!(fixture.popup_events(), vec![PopupEvent::Closed]);
        assert_eq!(provider.calls(), 1);

        let cached = fixture.locator.cache().last().unwrap();
        assert_eq!(cached.coordinate, HOME);

        let Viewport::Bounds { bounds } = viewport_for(&ids, &venues) else {
            panic!("expected bounds for five venues");
        };

        for place in venues.iter().filter(|place| place.city == "Budapest") {
            assert!(bounds.contains(place.location));
        }

        assert!(fixture.notices.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_cache_skips_provider() {
        let venues = budapest_and_szeged();
        let provider = Scripted::new(0, Ok(SZEGED));
        let fixture = Fixture::new(provider.clone());

        let observed_at = Utc::now() - TimeDelta::seconds(60);
        fixture.locator.cache().store_at(HOME, observed_at);

        let started = Instant::now();
        let ids = fixture.locator.resolve(&venues).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(provider.calls(), 0);
        assert_eq!(as_str(&ids), vec!["b1", "b5", "b2", "b4", "b3"]);

        // reuse counts as a new observation
        let cached = fixture.locator.cache().last().unwrap();
        assert_eq!(cached.coordinate, HOME);
        assert!(cached.observed_at > observed_at);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_cache_asks_provider() {
        let venues = budapest_and_szeged();
        let provider = Scripted::new(10, Ok(SZEGED));
        let fixture = Fixture::new(provider.clone());
        fixture.locator.cache().store_at(HOME, Utc::now() - TimeDelta::minutes(10));

        let origin = fixture.locator.locate().await;

        assert_eq!(origin, Origin::Live(SZEGED));
        assert_eq!(provider.calls(), 1);
        assert_eq!(fixture.locator.cache().last().unwrap().coordinate, SZEGED);

        let ids = fixture.locator.resolve(&venues).await;
        assert_eq!(as_str(&ids)[..3], ["s1", "s2", "s3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_provider_falls_back_immediately() {
        let venues = budapest_and_szeged();
        let provider = Scripted::new(100, Err(PositionError::PermissionDenied));
        let fixture = Fixture::new(provider);

        let started = Instant::now();
        let ids = fixture.locator.resolve(&venues).await;

        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(ids, find_fallback(&venues));
        assert!(fixture.locator.cache().last().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_provider_falls_back_without_delay() {
        let venues = budapest_and_szeged();
        let fixture = Fixture::new(Arc::new(NoPosition));

        let started = Instant::now();
        let ids = fixture.locator.resolve(&venues).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(ids, find_fallback(&venues));
        assert_eq!(fixture.highlighted(), ids);
    }

    #[tokio::test(start_paused = true)]
    async fn late_position_loses_against_fallback() {
        let venues = budapest_and_szeged();
        let provider = Scripted::new(800, Ok(SZEGED));
        let mut fixture = Fixture::new(provider);

        let started = Instant::now();
        let ids = fixture.locator.resolve(&venues).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(800));

        let fallback = find_fallback(&venues);
        assert_eq!(ids, fallback);
        assert!(ids.iter().all(|id| id.starts_with('b')));

        // let the live request finish
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(fixture.highlighted(), fallback);
        assert_eq!(fixture.popup_events(), vec![PopupEvent::Closed]);
        assert_eq!(fixture.locator.cache().last().unwrap().coordinate, SZEGED);
    }

    #[tokio::test(start_paused = true)]
    async fn position_and_fallback_on_the_same_tick() {
        let venues = budapest_and_szeged();
        let provider = Scripted::new(500, Ok(SZEGED));
        let mut fixture = Fixture::new(provider);

        let live = find_nearby(SZEGED, &venues);
        let fallback = find_fallback(&venues);
        assert_ne!(live, fallback);

        let started = Instant::now();
        let ids = fixture.locator.resolve(&venues).await;

        assert_eq!(started.elapsed(), Duration::from_millis(500));
        assert!(ids == live || ids == fallback);

        tokio::time::sleep(Duration::from_millis(500)).await;

        // the loser never publishes
        assert_eq!(fixture.highlighted(), ids);
        assert_eq!(fixture.popup_events(), vec![PopupEvent::Closed]);
        assert_eq!(fixture.locator.cache().last().unwrap().coordinate, SZEGED);
    }

    #[tokio::test(start_paused = true)]
    async fn known_position_skips_the_race() {
        let venues = budapest_and_szeged();
        let provider = Scripted::new(0, Ok(HOME));
        let mut fixture = Fixture::new(provider.clone());

        let started = Instant::now();
        let ids = fixture.locator.resolve_at(SZEGED, &venues);

        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(provider.calls(), 0);
        assert_eq!(ids, find_nearby(SZEGED, &venues));
        assert_eq!(fixture.highlighted(), ids);
        assert_eq!(fixture.popup_events(), vec![PopupEvent::Closed]);
        assert_eq!(fixture.locator.cache().last().unwrap().coordinate, SZEGED);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_provider_times_out() {
        let venues = budapest_and_szeged();
        let provider = Scripted::hanging();
        let fixture = Fixture::new(provider.clone());

        let started = Instant::now();
        let ids = fixture.locator.resolve(&venues).await;

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(ids, find_fallback(&venues));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(provider.calls(), 1);
        assert!(fixture.locator.cache().last().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn position_timeout_shorter_than_fallback_delay() {
        let options = LocateOptions {
            fallback_delay: Duration::from_millis(500),
            position: PositionOptions {
                timeout: Duration::from_millis(200),
                ..PositionOptions::default()
            },
        };

        let fixture = Fixture::with_options(Scripted::hanging(), options);

        let started = Instant::now();
        assert_eq!(fixture.locator.locate().await, Origin::Fallback);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_result_notifies() {
        let venues: Vec<Place> = Vec::new();
        let mut fixture = Fixture::new(Arc::new(NoPosition));
        fixture.locator.highlights.set(&[ArcStr::from("old")]);

        let ids = fixture.locator.resolve(&venues).await;

        assert!(ids.is_empty());
        assert_eq!(fixture.notices.messages(), vec![NO_RESULTS_NOTICE.to_owned()]);
        assert_eq!(as_str(&fixture.highlighted()), vec!["old"]);
        assert!(fixture.popup_events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn track_copies_updates_into_cache() {
        let (updates, _) = watch::channel(HOME);
        let provider = Arc::new(Watching { updates });
        let fixture = Fixture::new(provider.clone());

        let handle = fixture.locator.track().unwrap();
        provider.updates.send_replace(SZEGED);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(fixture.locator.cache().last().unwrap().coordinate, SZEGED);

        drop(fixture);
        drop(provider);
        handle.await.unwrap();
    }

    #[test]
    fn track_without_watch_support() {
        let fixture = Fixture::new(Arc::new(NoPosition));
        assert!(fixture.locator.track().is_none());
    }
}
