use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

mod city;
mod nearby;
mod viewport;

#[cfg(test)]
mod testing;

pub use city::{densest_city, detect_city, CITY_DENSITY_RADIUS, CITY_SHORTCUT_RADIUS};
pub use nearby::{find_fallback, find_nearby, nearest, EXTENDED_RADIUS, HARD_CAP_RADIUS, MIN_RESULTS, SEARCH_RADII};
pub use viewport::{compute_viewport, viewport_for, BoundingBox, Viewport, BOUNDS_PADDING, CLOSE_UP_ZOOM};

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    #[error("cannot compute a result over an empty venue set")]
    EmptyInput,

    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// A point on earth in degrees. Coordinates are never normalized.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting values outside of lat [-90, 90] and lng [-180, 180].
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        let coordinate = Coordinate { lat, lng };
        if !coordinate.is_valid() {
            return Err(GeoError::InvalidCoordinate { lat, lng });
        }

        Ok(coordinate)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Anything that can be placed on the map and resolved as "nearby".
pub trait Venue {
    fn id(&self) -> &ArcStr;
    fn location(&self) -> Coordinate;
    fn city(&self) -> &str;
}

impl<V: Venue + ?Sized> Venue for &V {
    fn id(&self) -> &ArcStr {
        (**self).id()
    }

    fn location(&self) -> Coordinate {
        (**self).location()
    }

    fn city(&self) -> &str {
        (**self).city()
    }
}

/// Great-circle distance between two coordinates in meters (haversine).
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Arithmetic mean of latitudes and longitudes of all venues.
pub fn centroid<V: Venue>(venues: &[V]) -> Result<Coordinate, GeoError> {
    if venues.is_empty() {
        return Err(GeoError::EmptyInput);
    }

    let count = venues.len() as f64;
    let (lat, lng) = venues
        .iter()
        .map(Venue::location)
        .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));

    Ok(Coordinate { lat: lat / count, lng: lng / count })
}
