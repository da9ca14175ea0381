use arcstr::ArcStr;
use chrono::{DateTime, Utc};
use partymap_geo::{Coordinate, Venue};
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod config;
pub mod highlight;
pub mod locate;
pub mod notify;
pub mod popup;
pub mod position;
pub mod search;
pub mod settle;
pub mod store;

/// A physical place (club, bar, open-air stage) that hosts events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: ArcStr,
    pub name: String,
    pub location: Coordinate,
    pub address: String,
    pub city: String,
    pub description: String,
    pub image: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Venue for Place {
    fn id(&self) -> &ArcStr {
        &self.id
    }

    fn location(&self) -> Coordinate {
        self.location
    }

    fn city(&self) -> &str {
        &self.city
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Disco,
    Techno,
    Festival,
    Jazz,
    Alter,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: ArcStr,
    pub title: String,
    pub place_id: ArcStr,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub image: String,

    #[serde(default)]
    pub performer_ids: Vec<ArcStr>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    pub kind: EventKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer {
    pub id: ArcStr,
    pub name: String,
    pub genre: String,
    pub bio: String,
    pub image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<PerformerLink>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PerformerLink {
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub url: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Instagram,
    Facebook,
    Website,
}
