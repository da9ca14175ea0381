use arcstr::ArcStr;
use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::{centroid, densest_city, detect_city, distance_meters, Coordinate, Venue};

/// Number of venues a nearby search tries to find.
pub const MIN_RESULTS: usize = 5;

/// Radii tried in increasing order until enough venues are found.
pub const SEARCH_RADII: [f64; 3] = [3_000.0, 10_000.0, 30_000.0];

/// Venues further away than this never make it into the primary result set.
pub const HARD_CAP_RADIUS: f64 = 30_000.0;

/// Short result sets are padded with venues up to this distance.
pub const EXTENDED_RADIUS: f64 = 35_000.0;

#[derive(Copy, Clone, Debug)]
struct Candidate {
    index: usize,
    distance: f64,
}

/// Finds up to [MIN_RESULTS] venues near `user`, ordered by ascending distance.
///
/// The search first looks into the city the user is in (see [detect_city]), escalating the
/// search radius until enough venues are found. Short results are padded from the 30-35 km
/// band of the same city, then from any city within 35 km. If no city can be detected, the
/// same search runs over all venues. If that finds nothing either, the globally nearest
/// venues are returned regardless of their distance.
///
/// Venues at equal distance keep their relative order from `venues`.
pub fn find_nearby<V: Venue>(user: Coordinate, venues: &[V]) -> Vec<ArcStr> {
    let candidates = rank(user, venues);

    if let Some(city) = detect_city(user, venues) {
        let in_city = candidates
            .iter()
            .copied()
            .filter(|c| venues[c.index].city() == city)
            .collect_vec();

        let found = escalate(&in_city, &candidates);
        if !found.is_empty() {
            return ids(venues, &found);
        }
    }

    let found = escalate(&candidates, &candidates);
    if !found.is_empty() {
        return ids(venues, &found);
    }

    let nearest = candidates
        .into_iter()
        .sorted_by_key(|c| OrderedFloat(c.distance))
        .take(MIN_RESULTS)
        .collect_vec();

    ids(venues, &nearest)
}

/// The `limit` venues closest to `point`, ordered by ascending distance.
pub fn nearest<V: Venue>(point: Coordinate, venues: &[V], limit: usize) -> Vec<ArcStr> {
    let nearest = rank(point, venues)
        .into_iter()
        .sorted_by_key(|c| OrderedFloat(c.distance))
        .take(limit)
        .collect_vec();

    ids(venues, &nearest)
}

/// Result used when the user position is not known: the venues nearest to the center of
/// the city with the most venues.
pub fn find_fallback<V: Venue>(venues: &[V]) -> Vec<ArcStr> {
    let Some(city) = densest_city(venues) else {
        return Vec::new();
    };

    let members = venues.iter().filter(|venue| venue.city() == city).collect_vec();

    let Ok(center) = centroid(&members) else {
        return Vec::new();
    };

    nearest(center, venues, MIN_RESULTS)
}

fn rank<V: Venue>(user: Coordinate, venues: &[V]) -> Vec<Candidate> {
    venues
        .iter()
        .enumerate()
        .map(|(index, venue)| Candidate { index, distance: distance_meters(user, venue.location()) })
        .collect()
}

/// Radius escalation over `pool`, padded from the extended band of `pool` and then from `all`.
fn escalate(pool: &[Candidate], all: &[Candidate]) -> Vec<Candidate> {
    let mut found = Vec::new();

    for radius in SEARCH_RADII {
        let within = pool.iter().copied().filter(|c| c.distance <= radius).collect_vec();

        if !within.is_empty() {
            found = within;

            if found.len() >= MIN_RESULTS {
                break;
            }
        }
    }

    found.retain(|c| c.distance <= HARD_CAP_RADIUS);

    // same pool, just outside of the hard cap
    if found.len() < MIN_RESULTS {
        let band = pool
            .iter()
            .copied()
            .filter(|c| c.distance > HARD_CAP_RADIUS && c.distance <= EXTENDED_RADIUS);

        pad(&mut found, band);
    }

    // anything else close enough, no matter the city
    if found.len() < MIN_RESULTS {
        let others = all.iter().copied().filter(|c| c.distance <= EXTENDED_RADIUS);
        pad(&mut found, others);
    }

    // padding appends out of input order, the index restores it for equal distances
    found.sort_by_key(|c| (OrderedFloat(c.distance), c.index));
    found.truncate(MIN_RESULTS);
    found
}

fn pad(found: &mut Vec<Candidate>, extra: impl Iterator<Item = Candidate>) {
    let missing = MIN_RESULTS.saturating_sub(found.len());

    let extra = extra
        .filter(|c| !found.iter().any(|f| f.index == c.index))
        .sorted_by_key(|c| (OrderedFloat(c.distance), c.index))
        .take(missing)
        .collect_vec();

    found.extend(extra);
}

fn ids<V: Venue>(venues: &[V], candidates: &[Candidate]) -> Vec<ArcStr> {
    candidates.iter().map(|c| venues[c.index].id().clone()).collect()
}
