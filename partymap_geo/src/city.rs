use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::{distance_meters, Coordinate, Venue};

/// If the nearest venue is at most this far away, the user is in that venue's city.
pub const CITY_SHORTCUT_RADIUS: f64 = 30_000.0;

/// Radius in which venues count towards a city when there is no obvious nearest city.
pub const CITY_DENSITY_RADIUS: f64 = 12_000.0;

/// Infers the name of the city the user at `user` is in.
///
/// Returns the city of the nearest venue if that one is within [CITY_SHORTCUT_RADIUS].
/// Otherwise the city with the most venues within [CITY_DENSITY_RADIUS] wins, ties going to
/// the city that appears first in `venues`. Returns `None` if no city has any venue in range.
pub fn detect_city<V: Venue>(user: Coordinate, venues: &[V]) -> Option<&str> {
    let (nearest, distance) = venues
        .iter()
        .map(|venue| (venue, distance_meters(user, venue.location())))
        .min_by_key(|(_, distance)| OrderedFloat(*distance))?;

    if distance <= CITY_SHORTCUT_RADIUS {
        return Some(nearest.city());
    }

    busiest_city(user, venues, CITY_DENSITY_RADIUS)
}

/// The city with the most venues overall, ties going to the first city in `venues`.
pub fn densest_city<V: Venue>(venues: &[V]) -> Option<&str> {
    let counts = cities(venues).map(|city| {
        let count = venues.iter().filter(|venue| venue.city() == city).count();
        (city, count)
    });

    first_max(counts)
}

fn busiest_city<V: Venue>(user: Coordinate, venues: &[V], radius: f64) -> Option<&str> {
    let counts = cities(venues).map(|city| {
        let count = venues
            .iter()
            .filter(|venue| venue.city() == city)
            .filter(|venue| distance_meters(user, venue.location()) <= radius)
            .count();

        (city, count)
    });

    first_max(counts)
}

/// Distinct city names in order of first appearance.
fn cities<V: Venue>(venues: &[V]) -> impl Iterator<Item = &str> + '_ {
    venues.iter().map(Venue::city).unique()
}

// strictly greater, so the first city keeps a tie
fn first_max<'a>(counts: impl Iterator<Item = (&'a str, usize)>) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;

    for (city, count) in counts {
        if count > best.map_or(0, |(_, best)| best) {
            best = Some((city, count));
        }
    }

    best.map(|(city, _)| city)
}
