use std::sync::Arc;

use arcstr::ArcStr;
use itertools::Itertools;
use tokio::sync::RwLock;
#[cfg(test)]
use tokio::sync::RwLockWriteGuard;

use crate::partymap::catalog::Catalog;
use crate::partymap::search::{search, SearchHit};
use crate::partymap::{Event, Performer, Place};

/// Read access to the catalog shared by all request handlers.
#[derive(Clone)]
pub struct VenueStore {
    state: Arc<RwLock<Catalog>>,
}

impl VenueStore {
    pub fn new(catalog: Catalog) -> Self {
        Self { state: Arc::new(RwLock::new(catalog)) }
    }

    pub async fn places(&self) -> Vec<Place> {
        let state = self.state.read().await;
        state.places.clone()
    }

    pub async fn place(&self, id: &str) -> Option<Place> {
        let state = self.state.read().await;
        state.places.iter().find(|place| place.id == id).cloned()
    }

    pub async fn events(&self) -> Vec<Event> {
        let state = self.state.read().await;
        state.events.clone()
    }

    pub async fn event(&self, id: &str) -> Option<Event> {
        let state = self.state.read().await;
        state.events.iter().find(|event| event.id == id).cloned()
    }

    /// Events at a place, earliest first.
    pub async fn events_for_place(&self, place_id: &str) -> Vec<Event> {
        let state = self.state.read().await;

        state
            .events
            .iter()
            .filter(|event| event.place_id == place_id)
            .sorted_by_key(|event| event.start)
            .cloned()
            .collect_vec()
    }

    /// Events a performer plays at, earliest first.
    pub async fn events_for_performer(&self, performer_id: &str) -> Vec<Event> {
        let state = self.state.read().await;

        state
            .events
            .iter()
            .filter(|event| event.performer_ids.iter().any(|id| id == performer_id))
            .sorted_by_key(|event| event.start)
            .cloned()
            .collect_vec()
    }

    pub async fn performers(&self) -> Vec<Performer> {
        let state = self.state.read().await;
        state.performers.clone()
    }

    pub async fn performer(&self, id: &str) -> Option<Performer> {
        let state = self.state.read().await;
        state.performers.iter().find(|performer| performer.id == id).cloned()
    }

    /// Performers of the given ids, in the order of the ids. Unknown ids are skipped.
    pub async fn performers_by_id(&self, ids: &[ArcStr]) -> Vec<Performer> {
        let state = self.state.read().await;

        ids.iter()
            .filter_map(|id| state.performers.iter().find(|performer| &performer.id == id))
            .cloned()
            .collect_vec()
    }

    pub async fn search(&self, query: &str, max_hits: usize) -> Vec<SearchHit> {
        let state = self.state.read().await;
        search(query, &state, max_hits)
    }

    /// Blocks all readers until the guard is dropped.
    #[cfg(test)]
    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.state.write().await
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeDelta;

    use crate::partymap::catalog::Catalog;
    use crate::partymap::store::VenueStore;
    use crate::partymap::testing::{event, performer, place};
    use crate::partymap::Event;

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    fn store() -> VenueStore {
        let mut late = event("e1", "p1", &["a1", "a2"]);
        late.start += TimeDelta::days(2);
        late.end += TimeDelta::days(2);

        VenueStore::new(Catalog {
            places: vec![place("p1", "Budapest", 47.49, 19.05), place("p2", "Budapest", 47.50, 19.06)],
            events: vec![late, event("e2", "p2", &["a1"]), event("e3", "p1", &[])],
            performers: vec![performer("a1", "DJ Nova", "Techno"), performer("a2", "Luna Jazz Trio", "Jazz")],
        })
    }

    #[tokio::test]
    async fn lookups() {
        let store = store();

        assert_eq!(store.places().await.len(), 2);
        assert_eq!(store.place("p2").await.unwrap().id.as_str(), "p2");
        assert!(store.place("p3").await.is_none());

        assert_eq!(store.events().await.len(), 3);
        assert_eq!(store.event("e2").await.unwrap().place_id.as_str(), "p2");
        assert!(store.event("e9").await.is_none());

        assert_eq!(store.performers().await.len(), 2);
        assert_eq!(store.performer("a2").await.unwrap().name, "Luna Jazz Trio");
    }

    #[tokio::test]
    async fn events_are_sorted_by_start() {
        let store = store();

        assert_eq!(ids(&store.events_for_place("p1").await), vec!["e3", "e1"]);
        assert_eq!(ids(&store.events_for_performer("a1").await), vec!["e2", "e1"]);
        assert!(store.events_for_place("p9").await.is_empty());
    }

    #[tokio::test]
    async fn performers_by_id_keeps_order() {
        let store = store();

        let ids = ["a2", "a9", "a1"].map(arcstr::ArcStr::from);
        let names = store
            .performers_by_id(&ids)
            .await
            .into_iter()
            .map(|performer| performer.name)
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["Luna Jazz Trio", "DJ Nova"]);
    }
}
