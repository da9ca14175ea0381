use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::partymap::{Event, Performer, Place};

/// Everything shown on the map, as read from the catalog file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub places: Vec<Place>,

    #[serde(default)]
    pub events: Vec<Event>,

    #[serde(default)]
    pub performers: Vec<Performer>,
}

impl Catalog {
    /// Checks that all places have valid coordinates and distinct ids.
    ///
    /// Dangling references from events are only logged, the event is still listed.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for place in &self.places {
            if !place.location.is_valid() {
                bail!(
                    "place {:?} has an invalid location: lat={}, lng={}",
                    place.id,
                    place.location.lat,
                    place.location.lng
                );
            }

            if !seen.insert(&place.id) {
                bail!("duplicate place id {:?}", place.id);
            }
        }

        let performers: HashSet<_> = self.performers.iter().map(|performer| &performer.id).collect();

        for event in &self.events {
            if !seen.contains(&event.place_id) {
                warn!("Event {:?} refers to unknown place {:?}", event.id, event.place_id);
            }

            for performer_id in &event.performer_ids {
                if !performers.contains(performer_id) {
                    warn!("Event {:?} refers to unknown performer {:?}", event.id, performer_id);
                }
            }
        }

        Ok(())
    }
}

pub fn load(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();

    let fp = File::open(path).with_context(|| format!("open catalog {:?}", path))?;
    let catalog: Catalog = serde_yaml::from_reader(fp).with_context(|| format!("parse catalog {:?}", path))?;
    catalog.validate().with_context(|| format!("validate catalog {:?}", path))?;

    info!(
        "Loaded {} places, {} events and {} performers from {:?}",
        catalog.places.len(),
        catalog.events.len(),
        catalog.performers.len(),
        path,
    );

    Ok(catalog)
}
