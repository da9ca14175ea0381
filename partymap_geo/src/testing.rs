use arcstr::ArcStr;

use crate::{Coordinate, Venue, EARTH_RADIUS_METERS};

#[derive(Clone, Debug)]
pub struct Spot {
    pub id: ArcStr,
    pub city: String,
    pub location: Coordinate,
}

impl Venue for Spot {
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

pub fn spot(id: &str, city: &str, location: Coordinate) -> Spot {
    Spot { id: ArcStr::from(id), city: city.to_owned(), location }
}

/// A point exactly `meters` north of `origin` along its meridian.
pub fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
    Coordinate { lat: origin.lat + (meters / EARTH_RADIUS_METERS).to_degrees(), lng: origin.lng }
}

/// A point exactly `meters` south of `origin` along its meridian.
pub fn south_of(origin: Coordinate, meters: f64) -> Coordinate {
    north_of(origin, -meters)
}

pub fn ids(values: &[ArcStr]) -> Vec<&str> {
    values.iter().map(ArcStr::as_str).collect()
}
