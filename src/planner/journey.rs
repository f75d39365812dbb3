//! Public result types: [`Journey`] and [`Segment`]. These are what a caller
//! actually receives; RAPTOR's own back-pointer chain (`raptor::Parent`) is
//! `pub(crate)` and never leaves the crate, so this module is where a raw
//! label path gets turned into something a caller outside the crate can hold.

use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    mobility::{MobilityMode, TariffTable},
    raptor::{self, ParentType},
    repository::Repository,
    shared::{
        geo::Distance,
        time::{Duration, Time},
    },
};

/// What kind of leg a [`Segment`] represents.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    Walk,
    Mobility(MobilityMode),
    Transit {
        route_id: Arc<str>,
        line_label: String,
        board_stop: Arc<str>,
        alight_stop: Arc<str>,
    },
}

/// One leg of a [`Journey`]. `distance` is the physical distance actually
/// walked or ridden; transit legs carry no distance (the dataset has no
/// shape geometry), so theirs is always zero.
#[derive(Debug, Clone)]
pub struct Segment {
    pub kind: SegmentKind,
    pub departure_time: Time,
    pub arrival_time: Time,
    pub distance: Distance,
    pub cost: u32,
}

impl Segment {
    pub fn walk(departure_time: Time, arrival_time: Time, distance: Distance) -> Self {
        Self {
            kind: SegmentKind::Walk,
            departure_time,
            arrival_time,
            distance,
            cost: 0,
        }
    }

    pub fn mobility(
        mode: MobilityMode,
        departure_time: Time,
        arrival_time: Time,
        distance: Distance,
        cost: u32,
    ) -> Self {
        Self {
            kind: SegmentKind::Mobility(mode),
            departure_time,
            arrival_time,
            distance,
            cost,
        }
    }

    fn transit(
        route_id: Arc<str>,
        line_label: String,
        board_stop: Arc<str>,
        alight_stop: Arc<str>,
        departure_time: Time,
        arrival_time: Time,
    ) -> Self {
        Self {
            kind: SegmentKind::Transit {
                route_id,
                line_label,
                board_stop,
                alight_stop,
            },
            departure_time,
            arrival_time,
            distance: Distance::from_meters(0.0),
            cost: 0,
        }
    }

    pub fn is_mobility(&self) -> bool {
        matches!(self.kind, SegmentKind::Mobility(_))
    }

    pub fn transit_route_id(&self) -> Option<&Arc<str>> {
        match &self.kind {
            SegmentKind::Transit { route_id, .. } => Some(route_id),
            _ => None,
        }
    }
}

/// One ranked itinerary: an ordered chain of [`Segment`]s plus the totals
/// [`super::scoring::score`] ranks candidates on.
#[derive(Debug, Clone)]
pub struct Journey {
    pub segments: Vec<Segment>,
    pub travel_seconds: u32,
    pub walk_meters: Distance,
    pub transfer_count: u32,
    pub cost: u32,
    pub strategy: &'static str,
}

impl Journey {
    /// Builds totals from a finished segment chain. `tariff` prices the
    /// transit portion: a flat fare if any transit segment is present, plus a
    /// per-km surcharge once the journey also mixes in a mobility leg.
    pub fn from_segments(segments: Vec<Segment>, strategy: &'static str, tariff: &TariffTable) -> Self {
        let travel_seconds = match (segments.first(), segments.last()) {
            (Some(first), Some(last)) => (last.arrival_time - first.departure_time).as_seconds(),
            _ => 0,
        };
        let walk_meters = segments
            .iter()
            .filter(|segment| matches!(segment.kind, SegmentKind::Walk))
            .fold(Distance::from_meters(0.0), |acc, segment| acc + segment.distance);
        let distinct_routes: HashSet<&Arc<str>> = segments.iter().filter_map(Segment::transit_route_id).collect();
        let transfer_count = distinct_routes.len().saturating_sub(1) as u32;
        let has_transit = !distinct_routes.is_empty();
        let has_mobility = segments.iter().any(Segment::is_mobility);

        let mobility_cost: u32 = segments.iter().map(|segment| segment.cost).sum();
        let mobility_meters: f32 = segments
            .iter()
            .filter(|segment| segment.is_mobility())
            .map(|segment| segment.distance.as_meters())
            .sum();
        let transit_fare = if has_transit {
            let surcharge = if has_mobility {
                (tariff.hybrid_surcharge_per_km as f32 * (mobility_meters / 1000.0).ceil()) as u32
            } else {
                0
            };
            tariff.transit_flat + surcharge
        } else {
            0
        };

        Self {
            segments,
            travel_seconds,
            walk_meters,
            transfer_count,
            cost: mobility_cost + transit_fare,
            strategy,
        }
    }

    pub(crate) fn mobility_seconds(&self) -> u32 {
        self.segments
            .iter()
            .filter(|segment| segment.is_mobility())
            .map(|segment| (segment.arrival_time - segment.departure_time).as_seconds())
            .sum()
    }

    pub(crate) fn transit_seconds(&self) -> u32 {
        self.segments
            .iter()
            .filter(|segment| segment.transit_route_id().is_some())
            .map(|segment| (segment.arrival_time - segment.departure_time).as_seconds())
            .sum()
    }
}

/// Turns a RAPTOR back-pointer path (origin-to-destination order) into
/// walk/transit segments, the way the reference crate's `Itinerary::new`
/// turns a path into `Leg`s. `running_walk` is the cumulative walk distance
/// already carried by the label arriving at the path's first stop, so walk
/// increments along the path can be recovered by subtraction.
pub(crate) fn segments_from_path(
    repository: &Repository,
    path: &[raptor::Parent],
    mut running_walk: Distance,
) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(path.len());
    for parent in path {
        match parent.parent_type {
            ParentType::Transit(trip_idx) => {
                let route = repository.route_by_trip_idx(trip_idx);
                let board_stop = repository.stops[parent.from as usize].id.clone();
                let alight_stop = repository.stops[parent.to as usize].id.clone();
                segments.push(Segment::transit(
                    route.id.clone(),
                    route.label(),
                    board_stop,
                    alight_stop,
                    parent.departure_time,
                    parent.arrival_time,
                ));
                running_walk = parent.walk;
            }
            ParentType::Transfer | ParentType::Walk => {
                let increment = parent.walk - running_walk;
                running_walk = parent.walk;
                segments.push(Segment::walk(parent.departure_time, parent.arrival_time, increment));
            }
        }
    }
    segments
}

/// Stamps a leg of known `duration` starting at `start`, returning the
/// segment and the time at which the next leg in the chain begins.
pub(crate) fn stamp_leg(start: Time, duration: Duration, kind: SegmentKind, distance: Distance, cost: u32) -> (Segment, Time) {
    let arrival = start + duration;
    let segment = Segment {
        kind,
        departure_time: start,
        arrival_time: arrival,
        distance,
        cost,
    };
    (segment, arrival)
}
