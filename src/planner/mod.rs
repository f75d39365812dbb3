//! Multimodal Planner (C5): orchestrates micro-mobility legs and RAPTOR
//! rounds under a zone-derived strategy, then scores and ranks the resulting
//! candidate journeys.
//!
//! `plan` runs in five stages: strategy selection (`zone`), direct mobility
//! candidates, transit (and, when the strategy calls for it, hybrid
//! transit+mobility) candidates via a single augmented RAPTOR search, then
//! scoring and deduplication (`scoring`).

mod journey;
mod preference;
mod scoring;

pub use journey::{Journey, Segment, SegmentKind};
pub use preference::RoutePreference;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use thiserror::Error;
use tracing::debug;

use crate::{
    dataset::Dataset,
    mobility::{MobilityMode, MobilityVehicle, TariffTable},
    oracle::{MemoizedOracle, SharedOracle},
    raptor::{self, Allocator, Raptor, Source},
    repository::Repository,
    shared::{
        geo::{Coordinate, Distance},
        time::{Duration, Time},
    },
    zone::{self, Strategy, ZoneGrid, ZoneId},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("origin or destination lies outside the district bounding box")]
    OutOfBounds,
    #[error("no candidate journey survives scoring")]
    NoPathFound,
    #[error("dataset invariant violated: {0}")]
    DatasetInvariantViolated(#[from] crate::repository::Error),
}

/// The outcome of a [`Planner::plan`] call.
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub strategy: &'static str,
    pub journeys: Vec<Journey>,
    /// Set when the RAPTOR search inside this call hit its deadline before
    /// it would otherwise have terminated; `journeys` is best-so-far, never
    /// invalid, just possibly incomplete.
    pub timed_out: bool,
}

const MOBILITY_MODES: [MobilityMode; 3] = [MobilityMode::Bike, MobilityMode::Kickboard, MobilityMode::Ebike];

/// Cap on mobility vehicles considered per mode, per side, in the hybrid
/// (step 4) expansion, and on transit stops considered per mobility anchor.
const HYBRID_FANOUT: usize = 5;

/// Threshold, in strategy mobility weight, above which hybrid mobility+transit
/// candidates are worth the extra RAPTOR source/target fan-out.
const HYBRID_MOBILITY_WEIGHT_THRESHOLD: f32 = 0.2;

struct AccessPoint {
    source: Source,
    prefix: Vec<Segment>,
}

/// A suffix leg chain from a RAPTOR target stop out to the destination,
/// stamped with absolute times once the label's arrival time is known.
struct EgressTemplate {
    legs: Vec<(SegmentKind, Duration, Distance, u32)>,
}

impl EgressTemplate {
    fn total_duration(&self) -> Duration {
        self.legs.iter().fold(Duration::from_seconds(0), |acc, (_, duration, _, _)| acc + *duration)
    }

    fn stamp(&self, start: Time) -> Vec<Segment> {
        let mut t = start;
        self.legs
            .iter()
            .map(|(kind, duration, distance, cost)| {
                let (segment, next) = journey::stamp_leg(t, *duration, kind.clone(), *distance, *cost);
                t = next;
                segment
            })
            .collect()
    }
}

fn insert_access(map: &mut HashMap<u32, AccessPoint>, stop_idx: u32, source: Source, prefix: Vec<Segment>) {
    if map.get(&stop_idx).is_none_or(|existing| source.arrival_time < existing.source.arrival_time) {
        map.insert(stop_idx, AccessPoint { source, prefix });
    }
}

fn insert_egress(map: &mut HashMap<u32, EgressTemplate>, stop_idx: u32, template: EgressTemplate) {
    if map.get(&stop_idx).is_none_or(|existing| template.total_duration() < existing.total_duration()) {
        map.insert(stop_idx, template);
    }
}

/// The road-distance oracle a single `plan` call queries through: the
/// dataset's oracle wrapped in a fresh memoization table, so repeated probes
/// of the same stop/vehicle pair across access, egress, and hybrid fan-out
/// are resolved once per call rather than once per probe.
type QueryOracle = MemoizedOracle<SharedOracle>;

/// Orchestrates C1-C4 to answer `plan` queries over one [`Dataset`].
pub struct Planner<'a> {
    repository: &'a Repository,
    oracle: SharedOracle,
    tariff: TariffTable,
}

impl<'a> Planner<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            repository: &dataset.repository,
            oracle: dataset.oracle.clone(),
            tariff: dataset.tariff,
        }
    }

    /// Answers one `(origin, destination, departure_time, preference)` query.
    /// `allocator` must have been sized for this planner's repository; reuse
    /// the same allocator across calls to avoid reallocating its buffers.
    pub fn plan(
        &self,
        allocator: &mut Allocator,
        origin: Coordinate,
        destination: Coordinate,
        departure_time: Time,
        preference: &RoutePreference,
        deadline: Option<Instant>,
    ) -> Result<PlanResult, Error> {
        if !self.repository.bounding_box.contains(&origin) || !self.repository.bounding_box.contains(&destination) {
            return Err(Error::OutOfBounds);
        }

        let zone_grid = self.repository.zone_grid();
        let origin_zone = zone_grid.zone_of(&origin);
        let dest_zone = zone_grid.zone_of(&destination);
        let zone_distance = zone_grid.zone_distance(origin_zone, dest_zone);
        let strategy = zone::strategy_for(zone_distance);
        debug!(strategy = strategy.name, zone_distance, "selected routing strategy");

        let oracle = QueryOracle::new(self.oracle.clone());

        let mut candidates = self.direct_mobility_candidates(&oracle, origin, destination, departure_time, preference, strategy.name);

        let mut timed_out = false;
        if !strategy.is_mobility_only() {
            let (transit_candidates, search_timed_out) = self.transit_candidates(
                &oracle,
                allocator,
                &zone_grid,
                origin,
                destination,
                origin_zone,
                dest_zone,
                zone_distance,
                departure_time,
                preference,
                &strategy,
                deadline,
            );
            candidates.extend(transit_candidates);
            timed_out = search_timed_out;
        }

        if candidates.is_empty() {
            return Err(Error::NoPathFound);
        }

        let journeys = scoring::rank(candidates, preference, &strategy);

        Ok(PlanResult {
            strategy: strategy.name,
            journeys,
            timed_out,
        })
    }

    fn nearest_mobility(&self, point: &Coordinate, mode: MobilityMode, radius: Distance) -> Option<&MobilityVehicle> {
        self.repository.mobility_neighbors(point, radius).into_iter().find_map(|neighbor| {
            let vehicle = &self.repository.mobility_vehicles[neighbor.index as usize];
            (vehicle.mode == mode).then_some(vehicle)
        })
    }

    /// Step 2: a direct walk+ride+walk journey per mobility mode (when a
    /// vehicle exists near both ends), plus a pure-walk journey when the
    /// direct road distance is within `max_walk_distance`.
    fn direct_mobility_candidates(
        &self,
        oracle: &QueryOracle,
        origin: Coordinate,
        destination: Coordinate,
        departure_time: Time,
        preference: &RoutePreference,
        strategy_name: &'static str,
    ) -> Vec<Journey> {
        let mut journeys = Vec::new();

        for mode in MOBILITY_MODES {
            let pickup = self.nearest_mobility(&origin, mode, preference.max_walk_to_stop);
            let dropoff = self.nearest_mobility(&destination, mode, preference.max_walk_to_stop);
            if let (Some(pickup), Some(dropoff)) = (pickup, dropoff) {
                journeys.push(self.build_direct_mobility_journey(oracle, origin, destination, departure_time, mode, pickup, dropoff, strategy_name));
            }
        }

        let direct_distance = oracle.road_distance(origin, destination);
        if direct_distance <= preference.max_walk_distance {
            let duration = raptor::time_to_walk(direct_distance);
            let (segment, _) = journey::stamp_leg(departure_time, duration, SegmentKind::Walk, direct_distance, 0);
            journeys.push(Journey::from_segments(vec![segment], strategy_name, &self.tariff));
        }

        journeys
    }

    #[allow(clippy::too_many_arguments)]
    fn build_direct_mobility_journey(
        &self,
        oracle: &QueryOracle,
        origin: Coordinate,
        destination: Coordinate,
        departure_time: Time,
        mode: MobilityMode,
        pickup: &MobilityVehicle,
        dropoff: &MobilityVehicle,
        strategy_name: &'static str,
    ) -> Journey {
        let walk1_distance = oracle.road_distance(origin, pickup.coordinate);
        let (walk1, t) = journey::stamp_leg(departure_time, raptor::time_to_walk(walk1_distance), SegmentKind::Walk, walk1_distance, 0);

        let ride_distance = oracle.road_distance(pickup.coordinate, dropoff.coordinate);
        let ride_duration = pickup.ride_duration(ride_distance);
        let ride_cost = self.tariff.mobility(mode).cost(ride_duration);
        let (ride, t) = journey::stamp_leg(t, ride_duration, SegmentKind::Mobility(mode), ride_distance, ride_cost);

        let walk2_distance = oracle.road_distance(dropoff.coordinate, destination);
        let (walk2, _) = journey::stamp_leg(t, raptor::time_to_walk(walk2_distance), SegmentKind::Walk, walk2_distance, 0);

        Journey::from_segments(vec![walk1, ride, walk2], strategy_name, &self.tariff)
    }

    /// Steps 3 and 4 combined: builds the plain-walk access/egress anchor
    /// sets (step 3), widens them with zone-local mobility anchors when the
    /// strategy favors mobility (step 4), then runs one augmented RAPTOR
    /// search over the union. Running a single search over `A ∪ A′, E ∪ E′`
    /// finds the same Pareto-optimal augmented-graph paths as two sequential
    /// searches would, without duplicating RAPTOR's round-scanning cost.
    #[allow(clippy::too_many_arguments)]
    fn transit_candidates(
        &self,
        oracle: &QueryOracle,
        allocator: &mut Allocator,
        zone_grid: &ZoneGrid,
        origin: Coordinate,
        destination: Coordinate,
        origin_zone: ZoneId,
        dest_zone: ZoneId,
        zone_distance: u32,
        departure_time: Time,
        preference: &RoutePreference,
        strategy: &Strategy,
        deadline: Option<Instant>,
    ) -> (Vec<Journey>, bool) {
        let mut access_points: HashMap<u32, AccessPoint> = HashMap::new();
        let mut egress_points: HashMap<u32, EgressTemplate> = HashMap::new();

        for neighbor in self.repository.stop_neighbors(&origin, preference.max_walk_to_stop) {
            let arrival = departure_time + raptor::time_to_walk(neighbor.distance);
            let prefix = vec![Segment::walk(departure_time, arrival, neighbor.distance)];
            insert_access(&mut access_points, neighbor.index, Source::new(neighbor.index, arrival, neighbor.distance, 0), prefix);
        }

        for neighbor in self.repository.stop_neighbors(&destination, preference.max_walk_to_stop) {
            let duration = raptor::time_to_walk(neighbor.distance);
            let template = EgressTemplate {
                legs: vec![(SegmentKind::Walk, duration, neighbor.distance, 0)],
            };
            insert_egress(&mut egress_points, neighbor.index, template);
        }

        if strategy.mobility_weight > HYBRID_MOBILITY_WEIGHT_THRESHOLD && zone_distance >= 1 {
            self.augment_access(oracle, zone_grid, origin_zone, origin, departure_time, preference, &mut access_points);
            self.augment_egress(oracle, zone_grid, dest_zone, destination, preference, &mut egress_points);
        }

        if access_points.is_empty() || egress_points.is_empty() {
            return (Vec::new(), false);
        }

        let sources: Vec<Source> = access_points.values().map(|access| access.source).collect();
        let target_stops: Vec<u32> = egress_points.keys().copied().collect();

        let result = Raptor::new(self.repository).search(allocator, &sources, &target_stops, raptor::DEFAULT_K_MAX, deadline);

        let mut journeys = Vec::new();
        for (stop_idx, labels) in &result.labels {
            let Some(egress) = egress_points.get(stop_idx) else { continue };
            for label in labels {
                let origin_stop_idx = label.path.first().map(|parent| parent.from).unwrap_or(*stop_idx);
                let Some(access) = access_points.get(&origin_stop_idx) else { continue };

                let mut segments = access.prefix.clone();
                segments.extend(journey::segments_from_path(self.repository, &label.path, access.source.walk));
                segments.extend(egress.stamp(label.arrival_time));
                journeys.push(Journey::from_segments(segments, strategy.name, &self.tariff));
            }
        }

        (journeys, result.timed_out)
    }

    /// Widens the access set with mobility anchors in zones Chebyshev-adjacent
    /// to the origin's: walk to the vehicle, then ride it toward whichever
    /// nearby transit stops it could plausibly hand off to.
    fn augment_access(
        &self,
        oracle: &QueryOracle,
        zone_grid: &ZoneGrid,
        origin_zone: ZoneId,
        origin: Coordinate,
        departure_time: Time,
        preference: &RoutePreference,
        access_points: &mut HashMap<u32, AccessPoint>,
    ) {
        let neighbor_zones: HashSet<ZoneId> = zone_grid.neighbors(origin_zone, 1).into_iter().collect();

        for mode in MOBILITY_MODES {
            let mut vehicles = self.mobility_in_zones(zone_grid, mode, &neighbor_zones);
            vehicles.sort_by(|a, b| {
                oracle
                    .road_distance(origin, a.coordinate)
                    .partial_cmp(&oracle.road_distance(origin, b.coordinate))
                    .unwrap()
            });

            for vehicle in vehicles.into_iter().take(HYBRID_FANOUT) {
                let walk_distance = oracle.road_distance(origin, vehicle.coordinate);
                let walk_duration = raptor::time_to_walk(walk_distance);
                let ride_start = departure_time + walk_duration;

                let mut nearby_stops = self.repository.stop_neighbors(&vehicle.coordinate, preference.max_walk_to_stop);
                nearby_stops.truncate(HYBRID_FANOUT);

                for stop in nearby_stops {
                    let stop_coordinate = self.repository.stops[stop.index as usize].coordinate;
                    let ride_distance = oracle.road_distance(vehicle.coordinate, stop_coordinate);
                    let ride_duration = vehicle.ride_duration(ride_distance);
                    let ride_cost = self.tariff.mobility(mode).cost(ride_duration);
                    let arrival = ride_start + ride_duration;

                    let prefix = vec![
                        Segment::walk(departure_time, ride_start, walk_distance),
                        Segment::mobility(mode, ride_start, arrival, ride_distance, ride_cost),
                    ];
                    insert_access(access_points, stop.index, Source::new(stop.index, arrival, walk_distance, ride_cost), prefix);
                }
            }
        }
    }

    /// Symmetric to [`Self::augment_access`]: ride from a transit stop to a
    /// mobility anchor near the destination, then walk the last stretch.
    fn augment_egress(
        &self,
        oracle: &QueryOracle,
        zone_grid: &ZoneGrid,
        dest_zone: ZoneId,
        destination: Coordinate,
        preference: &RoutePreference,
        egress_points: &mut HashMap<u32, EgressTemplate>,
    ) {
        let neighbor_zones: HashSet<ZoneId> = zone_grid.neighbors(dest_zone, 1).into_iter().collect();

        for mode in MOBILITY_MODES {
            let mut vehicles = self.mobility_in_zones(zone_grid, mode, &neighbor_zones);
            vehicles.sort_by(|a, b| {
                oracle
                    .road_distance(destination, a.coordinate)
                    .partial_cmp(&oracle.road_distance(destination, b.coordinate))
                    .unwrap()
            });

            for vehicle in vehicles.into_iter().take(HYBRID_FANOUT) {
                let walk_distance = oracle.road_distance(vehicle.coordinate, destination);
                let walk_duration = raptor::time_to_walk(walk_distance);

                let mut nearby_stops = self.repository.stop_neighbors(&vehicle.coordinate, preference.max_walk_to_stop);
                nearby_stops.truncate(HYBRID_FANOUT);

                for stop in nearby_stops {
                    let stop_coordinate = self.repository.stops[stop.index as usize].coordinate;
                    let ride_distance = oracle.road_distance(stop_coordinate, vehicle.coordinate);
                    let ride_duration = vehicle.ride_duration(ride_distance);
                    let ride_cost = self.tariff.mobility(mode).cost(ride_duration);

                    let template = EgressTemplate {
                        legs: vec![
                            (SegmentKind::Mobility(mode), ride_duration, ride_distance, ride_cost),
                            (SegmentKind::Walk, walk_duration, walk_distance, 0),
                        ],
                    };
                    insert_egress(egress_points, stop.index, template);
                }
            }
        }
    }

    fn mobility_in_zones(&self, zone_grid: &ZoneGrid, mode: MobilityMode, zones: &HashSet<ZoneId>) -> Vec<&MobilityVehicle> {
        self.repository
            .mobility_vehicles
            .iter()
            .filter(|vehicle| vehicle.mode == mode && zones.contains(&zone_grid.zone_of(&vehicle.coordinate)))
            .collect()
    }
}
