use arcstr::ArcStr;
use serde::Serialize;

use crate::{Coordinate, Venue};

/// Zoom level used to show a single venue up close.
pub const CLOSE_UP_ZOOM: u8 = 16;

/// Margin added on each side of a bounding box, relative to its extent.
pub const BOUNDS_PADDING: f64 = 0.2;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// The smallest box containing all points, `None` if there are no points.
    pub fn around(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;

        let init = BoundingBox { south: first.lat, west: first.lng, north: first.lat, east: first.lng };

        let bounds = rest.iter().fold(init, |b, p| BoundingBox {
            south: b.south.min(p.lat),
            west: b.west.min(p.lng),
            north: b.north.max(p.lat),
            east: b.east.max(p.lng),
        });

        Some(bounds)
    }

    /// Extends the box on every side by `ratio` times its height or width.
    pub fn pad(&self, ratio: f64) -> Self {
        let lat = (self.north - self.south) * ratio;
        let lng = (self.east - self.west) * ratio;

        BoundingBox {
            south: self.south - lat,
            west: self.west - lng,
            north: self.north + lat,
            east: self.east + lng,
        }
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }
}

/// How the map should move to reveal a set of targets.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Viewport {
    None,
    Center { point: Coordinate, zoom: u8 },
    Bounds {
        #[serde(rename = "box")]
        bounds: BoundingBox,
    },
}

/// Recommends a viewport change that reveals all `targets`.
pub fn compute_viewport(targets: &[Coordinate]) -> Viewport {
    match targets {
        [] => Viewport::None,
        [point] => Viewport::Center { point: *point, zoom: CLOSE_UP_ZOOM },
        _ => match BoundingBox::around(targets) {
            Some(bounds) => Viewport::Bounds { bounds: bounds.pad(BOUNDS_PADDING) },
            None => Viewport::None,
        },
    }
}

/// Like [compute_viewport] for the venues with the given ids. Unknown ids are ignored.
pub fn viewport_for<V: Venue>(ids: &[ArcStr], venues: &[V]) -> Viewport {
    let targets = ids
        .iter()
        .filter_map(|id| venues.iter().find(|venue| venue.id() == id))
        .map(Venue::location)
        .collect::<Vec<_>>();

    compute_viewport(&targets)
}
