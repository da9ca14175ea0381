use arcstr::ArcStr;
use itertools::Itertools;
use serde::Serialize;

use crate::partymap::catalog::Catalog;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HitKind {
    Place,
    Event,
    Performer,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: HitKind,
    pub id: ArcStr,
    pub title: String,
    pub subtitle: String,
    pub href: String,
    pub image: String,

    /// The place to highlight for this hit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<ArcStr>,
}

/// Case insensitive substring search over the catalog.
///
/// Places come first, then events, then performers.
pub fn search(query: &str, catalog: &Catalog, max_hits: usize) -> Vec<SearchHit> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let matches = |text: &str| text.to_lowercase().contains(&query);

    let places = catalog
        .places
        .iter()
        .filter(|place| matches(&place.name) || place.tags.iter().any(|tag| matches(tag)))
        .map(|place| SearchHit {
            kind: HitKind::Place,
            id: place.id.clone(),
            title: place.name.clone(),
            subtitle: format!("{} • {}", place.city, place.tags.join(", ")),
            href: format!("/places/{}", place.id),
            image: place.image.clone(),
            place_id: Some(place.id.clone()),
        });

    let events = catalog
        .events
        .iter()
        .filter(|event| matches(&event.title) || matches(&event.description))
        .map(|event| {
            let place_name = catalog
                .places
                .iter()
                .find(|place| place.id == event.place_id)
                .map(|place| place.name.as_str())
                .unwrap_or("—");

            SearchHit {
                kind: HitKind::Event,
                id: event.id.clone(),
                title: event.title.clone(),
                subtitle: format!("at {}", place_name),
                href: format!("/events/{}", event.id),
                image: event.image.clone(),
                place_id: Some(event.place_id.clone()),
            }
        });

    let performers = catalog
        .performers
        .iter()
        .filter(|performer| matches(&performer.name) || matches(&performer.genre))
        .map(|performer| SearchHit {
            kind: HitKind::Performer,
            id: performer.id.clone(),
            title: performer.name.clone(),
            subtitle: performer.genre.clone(),
            href: format!("/performers/{}", performer.id),
            image: performer.image.clone(),
            place_id: None,
        });

    places.chain(events).chain(performers).take(max_hits).collect_vec()
}

/// The distinct places referenced by `hits`, in hit order.
pub fn highlight_ids(hits: &[SearchHit]) -> Vec<ArcStr> {
    hits.iter().filter_map(|hit| hit.place_id.clone()).unique().collect_vec()
}
