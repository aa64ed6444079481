//! R\*-tree lookup of stations around a destination.
//!
//! Points are projected onto a flat plane around the dataset's mean latitude
//! and bulk-loaded into an `rstar` tree. The query box is sized in degrees at
//! the query's own latitude, taking the poleward edge of the search circle,
//! and is mirrored across the antimeridian when it crosses it. Candidates are
//! then filtered by exact haversine distance, so results match a linear scan
//! wherever the stations sit.

use rstar::{AABB, RTree, RTreeObject};
use tripscore_core::{BikeStation, GeoPoint, ParkingLot, TransitStop, haversine_m};

const METRES_PER_DEGREE_LAT: f64 = 110_540.0;
const METRES_PER_DEGREE_LON_EQUATOR: f64 = 111_320.0;
/// Planar distances may under-read true distances by this factor.
const PROJECTION_SLACK: f64 = 1.25;
const PROJECTION_MARGIN_M: f64 = 25.0;
/// Circles reaching past this latitude search every longitude.
const MAX_SCALE_LATITUDE: f64 = 89.9;
const FULL_TURN_DEG: f64 = 360.0;
const HALF_TURN_DEG: f64 = 180.0;
/// Initial and growth factor for nearest-neighbour search boxes.
const NEAREST_START_M: f64 = 1_000.0;
const NEAREST_GROWTH: f64 = 4.0;
const NEAREST_ROUNDS: u32 = 8;

/// Anything with a position.
pub trait Located {
    /// Position of the item.
    fn location(&self) -> GeoPoint;
}

impl Located for TransitStop {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

impl Located for BikeStation {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

impl Located for ParkingLot {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    slot: usize,
    xy: [f64; 2],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xy)
    }
}

/// Spatial index over a dataset of located items.
#[derive(Debug)]
pub struct StationIndex<T> {
    items: Vec<T>,
    tree: RTree<IndexedPoint>,
    lon_scale: f64,
}

impl<T: Located> StationIndex<T> {
    /// Index `items`.
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        let lat0 = mean_latitude(&items);
        let lon_scale = lon_metres_per_degree(lat0);
        let points = items
            .iter()
            .enumerate()
            .map(|(slot, item)| IndexedPoint {
                slot,
                xy: project(item.location(), lon_scale),
            })
            .collect();
        Self {
            items,
            tree: RTree::bulk_load(points),
            lon_scale,
        }
    }

    /// Number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items within `radius_m` of `centre`, with their distances, in
    /// dataset order.
    #[must_use]
    pub fn within(&self, centre: GeoPoint, radius_m: f64) -> Vec<(&T, f64)> {
        if radius_m.is_nan() || radius_m <= 0.0 {
            return Vec::new();
        }
        let mut hits: Vec<(usize, f64)> = self
            .candidates(centre, radius_m)
            .into_iter()
            .filter_map(|(slot, d)| (d <= radius_m).then_some((slot, d)))
            .collect();
        hits.sort_unstable_by_key(|(slot, _)| *slot);
        hits.into_iter()
            .filter_map(|(slot, d)| self.items.get(slot).map(|item| (item, d)))
            .collect()
    }

    /// The closest item to `centre` and its distance.
    #[must_use]
    pub fn nearest(&self, centre: GeoPoint) -> Option<(&T, f64)> {
        if self.items.is_empty() {
            return None;
        }
        let mut reach = NEAREST_START_M;
        for _ in 0..NEAREST_ROUNDS {
            let best = closest(self.candidates(centre, reach).into_iter());
            if let Some((slot, d)) = best
                && d <= reach
            {
                return self.items.get(slot).map(|item| (item, d));
            }
            reach *= NEAREST_GROWTH;
        }
        let (slot, d) = closest(
            self.items
                .iter()
                .enumerate()
                .map(|(slot, item)| (slot, haversine_m(centre, item.location()))),
        )?;
        self.items.get(slot).map(|item| (item, d))
    }

    fn candidates(&self, centre: GeoPoint, radius_m: f64) -> Vec<(usize, f64)> {
        let reach_m = radius_m * PROJECTION_SLACK + PROJECTION_MARGIN_M;
        let lat_reach = reach_m / METRES_PER_DEGREE_LAT;
        let poleward = centre.lat().abs() + lat_reach;
        let lon_reach = if poleward >= MAX_SCALE_LATITUDE {
            HALF_TURN_DEG
        } else {
            (reach_m / lon_metres_per_degree(poleward)).min(HALF_TURN_DEG)
        };

        let [x, y] = project(centre, self.lon_scale);
        let half_x = lon_reach * self.lon_scale;
        let mut shifts = vec![0.0];
        if centre.lon() - lon_reach < -HALF_TURN_DEG {
            shifts.push(FULL_TURN_DEG);
        }
        if centre.lon() + lon_reach > HALF_TURN_DEG {
            shifts.push(-FULL_TURN_DEG);
        }

        let mut slots: Vec<usize> = shifts
            .into_iter()
            .flat_map(|shift| {
                let cx = x + shift * self.lon_scale;
                let envelope =
                    AABB::from_corners([cx - half_x, y - reach_m], [cx + half_x, y + reach_m]);
                self.tree
                    .locate_in_envelope_intersecting(&envelope)
                    .map(|point| point.slot)
                    .collect::<Vec<_>>()
            })
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
            .into_iter()
            .filter_map(|slot| {
                self.items
                    .get(slot)
                    .map(|item| (slot, haversine_m(centre, item.location())))
            })
            .collect()
    }
}

/// Metres spanned by one degree of longitude at `lat`.
fn lon_metres_per_degree(lat: f64) -> f64 {
    METRES_PER_DEGREE_LON_EQUATOR * lat.abs().min(MAX_SCALE_LATITUDE).to_radians().cos()
}

fn closest(candidates: impl Iterator<Item = (usize, f64)>) -> Option<(usize, f64)> {
    candidates.min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
}

fn project(point: GeoPoint, lon_scale: f64) -> [f64; 2] {
    [point.lon() * lon_scale, point.lat() * METRES_PER_DEGREE_LAT]
}

fn mean_latitude<T: Located>(items: &[T]) -> f64 {
    let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
    if count == 0 {
        return 0.0;
    }
    items.iter().map(|item| item.location().lat()).sum::<f64>() / f64::from(count)
}
