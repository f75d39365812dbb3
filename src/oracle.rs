//! Road Distance Oracle (C2): a memoized `road_distance` lookup with a
//! haversine x 1.3 circuity-factor fallback when no real road graph is wired in.
//!
//! Mirrors the dataset's own [`Coordinate::network_distance`] fallback, but
//! exposes it behind a swappable trait so a real OSM-backed implementation can
//! be dropped in without touching the planner.

use dashmap::DashMap;
use std::sync::Arc;

use crate::shared::geo::{Coordinate, Distance};

/// Quantization applied to cache keys; two queries within this many meters of
/// each other's endpoints are treated as the same lookup.
const QUANTIZATION_METERS: f32 = 5.0;

pub trait RoadDistanceOracle: Send + Sync {
    fn road_distance(&self, from: Coordinate, to: Coordinate) -> Distance;
}

/// The default oracle: haversine x 1.3, as specified for when no road graph
/// is available. This is the fallback every [`RoadDistanceOracle`] degrades to.
#[derive(Debug, Default, Clone, Copy)]
pub struct HaversineOracle;

impl RoadDistanceOracle for HaversineOracle {
    fn road_distance(&self, from: Coordinate, to: Coordinate) -> Distance {
        from.network_distance(&to)
    }
}

type CacheKey = (i64, i64, i64, i64);

fn quantize(coordinate: Coordinate) -> (i64, i64) {
    let scale = 1.0 / (QUANTIZATION_METERS / crate::shared::geo::LATITUDE_DISTANCE.as_meters());
    (
        (coordinate.latitude as f64 * scale as f64).round() as i64,
        (coordinate.longitude as f64 * scale as f64).round() as i64,
    )
}

/// Wraps any [`RoadDistanceOracle`] with a per-query memoization table, so a
/// planner run that repeatedly probes the same stop/vehicle pairs only pays
/// the underlying oracle's cost once per distinct (quantized) pair.
pub struct MemoizedOracle<O: RoadDistanceOracle> {
    inner: O,
    cache: DashMap<CacheKey, Distance>,
}

impl<O: RoadDistanceOracle> MemoizedOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn road_distance(&self, from: Coordinate, to: Coordinate) -> Distance {
        let (a_lat, a_lon) = quantize(from);
        let (b_lat, b_lon) = quantize(to);
        let key = if (a_lat, a_lon) <= (b_lat, b_lon) {
            (a_lat, a_lon, b_lat, b_lon)
        } else {
            (b_lat, b_lon, a_lat, a_lon)
        };
        if let Some(distance) = self.cache.get(&key) {
            return *distance;
        }
        let distance = self.inner.road_distance(from, to);
        self.cache.insert(key, distance);
        distance
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl Default for MemoizedOracle<HaversineOracle> {
    fn default() -> Self {
        Self::new(HaversineOracle)
    }
}

/// Lets a [`MemoizedOracle`] wrap another [`MemoizedOracle`] or stand in for
/// its inner oracle anywhere a [`RoadDistanceOracle`] is expected. Dispatches
/// to the inherent, cached `road_distance` above; not a recursive trait call.
impl<O: RoadDistanceOracle> RoadDistanceOracle for MemoizedOracle<O> {
    fn road_distance(&self, from: Coordinate, to: Coordinate) -> Distance {
        self.road_distance(from, to)
    }
}

impl<T: RoadDistanceOracle + ?Sized> RoadDistanceOracle for Arc<T> {
    fn road_distance(&self, from: Coordinate, to: Coordinate) -> Distance {
        (**self).road_distance(from, to)
    }
}

/// Type-erased handle the planner is constructed with, so callers can supply
/// their own oracle (e.g. a real road-graph adapter) without generic plumbing
/// leaking into [`crate::planner::Planner`].
pub type SharedOracle = Arc<dyn RoadDistanceOracle>;

pub fn default_oracle() -> SharedOracle {
    Arc::new(HaversineOracle)
}

#[test]
fn haversine_oracle_applies_circuity_factor() {
    let oracle = HaversineOracle;
    let a = Coordinate::new(37.4979, 127.0276);
    let b = Coordinate::new(37.5007, 127.0363);
    let euclidean = a.euclidean_distance(&b);
    let road = oracle.road_distance(a, b);
    assert!((road.as_meters() - euclidean.as_meters() * 1.3).abs() < 0.01);
}

#[test]
fn memoized_oracle_returns_same_distance_for_same_pair() {
    let oracle = MemoizedOracle::default();
    let a = Coordinate::new(37.4979, 127.0276);
    let b = Coordinate::new(37.5007, 127.0363);
    let first = oracle.road_distance(a, b);
    let second = oracle.road_distance(a, b);
    assert_eq!(first, second);
}
