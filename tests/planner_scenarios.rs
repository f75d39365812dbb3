//! End-to-end `Planner::plan` scenarios: the zone distance between origin and
//! destination decides the strategy, and the strategy decides whether a
//! candidate is mobility-only, transit-augmented-with-mobility, or
//! transit-only. Builds a `Dataset` directly (its fields are all public)
//! rather than reading a manifest off disk.

mod common;

use std::time::{Duration as StdDuration, Instant};

use transect::dataset::Dataset;
use transect::gtfs::GtfsData;
use transect::mobility::MobilityMode;
use transect::planner::{Error as PlannerError, Planner, RoutePreference};
use transect::raptor::Allocator;
use transect::shared::geo::Coordinate;
use transect::shared::time::Time;

fn dataset(data: GtfsData, vehicles: Vec<transect::mobility::MobilityVehicleRecord>) -> Dataset {
    let repository =
        common::build_repository(data, vehicles, common::district_bounding_box(), common::district_grid_size()).expect("fixture should load");
    Dataset {
        repository,
        oracle: transect::oracle::default_oracle(),
        tariff: transect::mobility::TariffTable::default(),
    }
}

#[test]
fn same_zone_trip_with_nearby_vehicles_at_both_ends_is_mobility_only() {
    // Origin and destination land in the same grid cell, and a bike sits
    // within walking distance of each, so a direct ride is available. A
    // transit route is also present but must be ignored: mobility_only
    // skips transit candidates entirely.
    let origin = Coordinate::new(37.50, 127.00);
    let destination = Coordinate::new(37.515, 127.015);

    let data = GtfsData {
        stops: vec![common::stop("s0", "Near Origin", 37.4995, 127.0005), common::stop("s1", "Near Dest", 37.5145, 127.0145)],
        routes: vec![common::route("r0", "1", 3)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "s0", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "s1", 2, "08:05:00", "08:05:00"),
        ],
    };
    let vehicles = vec![
        common::vehicle("bike-origin", MobilityMode::Bike, 37.4995, 127.0005),
        common::vehicle("bike-dest", MobilityMode::Bike, 37.5145, 127.0145),
    ];
    let dataset = dataset(data, vehicles);

    let planner = Planner::new(&dataset);
    let mut allocator = Allocator::new(&dataset.repository);
    let preference = RoutePreference::default();
    let result = planner
        .plan(&mut allocator, origin, destination, Time::from_hms("08:00:00").unwrap(), &preference, None)
        .expect("a direct ride should be found");

    assert_eq!(result.strategy, "mobility_only");
    assert!(!result.journeys.is_empty());
    for journey in &result.journeys {
        assert!(
            journey.segments.iter().all(|segment| segment.transit_route_id().is_none()),
            "mobility_only must never surface a transit candidate"
        );
    }
}

#[test]
fn identical_origin_and_destination_yields_a_single_zero_journey() {
    // A bike sits a few meters from O=D: without the scoring pass dropping
    // dominated candidates, its nonzero-cost ride would survive alongside
    // the true answer, a zero-length walk at zero cost.
    let origin = Coordinate::new(37.50, 127.00);
    let data = GtfsData::default();
    let vehicles = vec![common::vehicle("bike-here", MobilityMode::Bike, 37.5001, 127.0001)];
    let dataset = dataset(data, vehicles);

    let planner = Planner::new(&dataset);
    let mut allocator = Allocator::new(&dataset.repository);
    let preference = RoutePreference::default();
    let result = planner
        .plan(&mut allocator, origin, origin, Time::from_hms("08:00:00").unwrap(), &preference, None)
        .expect("O=D must always produce a zero-length walk journey");

    assert_eq!(result.strategy, "mobility_only");
    assert_eq!(result.journeys.len(), 1, "the dominated mobility candidate must not survive alongside the zero journey");
    let journey = &result.journeys[0];
    assert_eq!(journey.travel_seconds, 0);
    assert_eq!(journey.walk_meters.as_meters(), 0.0);
    assert_eq!(journey.cost, 0);
}

#[test]
fn adjacent_zone_trip_surfaces_a_hybrid_journey_via_augmented_access() {
    // Origin has no stop within plain walking distance, only a bike that is
    // itself within walking distance of a stop one hop further out. The
    // strategy at zone distance 1 (mobility_first, weight 0.8) crosses the
    // hybrid-augmentation threshold, so that bike+stop combination must be
    // found even though a plain walk from `origin` to `s1` would not be.
    let origin = Coordinate::new(37.4000, 126.9000);
    let vehicle_coordinate = Coordinate::new(37.4030, 126.9000);
    let stop_coordinate = Coordinate::new(37.4060, 126.9000);
    let destination = Coordinate::new(37.48, 126.98);
    let egress_stop_coordinate = Coordinate::new(37.4820, 126.98);

    let data = GtfsData {
        stops: vec![
            common::stop("s1", "Access", stop_coordinate.latitude, stop_coordinate.longitude),
            common::stop("s2", "Egress", egress_stop_coordinate.latitude, egress_stop_coordinate.longitude),
        ],
        routes: vec![common::route("r0", "1", 3)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "s1", 1, "08:10:00", "08:10:00"),
            common::stop_time("t0", "s2", 2, "08:30:00", "08:30:00"),
        ],
    };
    let vehicles = vec![common::vehicle("bike-1", MobilityMode::Bike, vehicle_coordinate.latitude, vehicle_coordinate.longitude)];
    let dataset = dataset(data, vehicles);

    let origin_zone = dataset.repository.zone_grid().zone_of(&origin);
    let dest_zone = dataset.repository.zone_grid().zone_of(&destination);
    let zone_distance = dataset.repository.zone_grid().zone_distance(origin_zone, dest_zone);
    assert_eq!(zone_distance, 1, "fixture must land exactly at the hybrid-augmentation zone distance");

    let planner = Planner::new(&dataset);
    let mut allocator = Allocator::new(&dataset.repository);
    let preference = RoutePreference::default();
    let result = planner
        .plan(&mut allocator, origin, destination, Time::from_hms("08:00:00").unwrap(), &preference, None)
        .expect("a hybrid walk+ride+transit+walk journey should be found");

    assert_eq!(result.strategy, "mobility_first");
    let has_hybrid_journey = result.journeys.iter().any(|journey| {
        journey.segments.iter().any(|segment| segment.is_mobility()) && journey.segments.iter().any(|segment| segment.transit_route_id().is_some())
    });
    assert!(has_hybrid_journey, "the augmented-access bike+stop anchor must reach the egress stop via transit");
}

#[test]
fn cross_district_trip_selects_transit_first_and_skips_mobility_augmentation() {
    // A trip spanning nearly the whole district bounding box lands at the
    // grid's maximum possible Chebyshev distance (grid_size - 1), landing on
    // transit_first: still below the hybrid-augmentation weight threshold,
    // so no mobility anchors are folded into the access/egress sets.
    let origin = Coordinate::new(37.41, 126.91);
    let destination = Coordinate::new(37.69, 127.19);

    let data = GtfsData {
        stops: vec![common::stop("s0", "Near Origin", 37.4105, 126.9105), common::stop("s1", "Near Dest", 37.6895, 127.1895)],
        routes: vec![common::route("r0", "1", 2)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "s0", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "s1", 2, "09:00:00", "09:00:00"),
        ],
    };
    let dataset = dataset(data, Vec::new());

    let origin_zone = dataset.repository.zone_grid().zone_of(&origin);
    let dest_zone = dataset.repository.zone_grid().zone_of(&destination);
    let zone_distance = dataset.repository.zone_grid().zone_distance(origin_zone, dest_zone);
    assert_eq!(zone_distance, 5, "fixture must land at the grid's maximum zone distance");

    let planner = Planner::new(&dataset);
    let mut allocator = Allocator::new(&dataset.repository);
    let preference = RoutePreference::default();
    let result = planner
        .plan(&mut allocator, origin, destination, Time::from_hms("08:00:00").unwrap(), &preference, None)
        .expect("the transit route should still be found");

    assert_eq!(result.strategy, "transit_first");
    assert!(result.journeys.iter().any(|journey| journey.segments.iter().any(|segment| segment.transit_route_id().is_some())));
}

#[test]
fn origin_outside_the_bounding_box_is_rejected() {
    let dataset = dataset(GtfsData::default(), Vec::new());
    let planner = Planner::new(&dataset);
    let mut allocator = Allocator::new(&dataset.repository);
    let preference = RoutePreference::default();

    let err = planner
        .plan(
            &mut allocator,
            Coordinate::new(10.0, 10.0),
            Coordinate::new(37.50, 127.00),
            Time::from_hms("08:00:00").unwrap(),
            &preference,
            None,
        )
        .expect_err("a coordinate outside the district bounding box must be rejected");

    assert!(matches!(err, PlannerError::OutOfBounds));
}

#[test]
fn a_trip_scheduled_past_midnight_is_still_reachable() {
    // GTFS service days run past 24:00:00 for trips that start before
    // midnight and end after it; a departure at 23:50 boarding a trip that
    // arrives at 24:05 must resolve correctly rather than wrapping.
    let data = GtfsData {
        stops: vec![common::stop("s0", "Origin", 37.50, 127.00), common::stop("s1", "Dest", 37.51, 127.02)],
        routes: vec![common::route("r0", "1", 3)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "s0", 1, "23:50:00", "23:50:00"),
            common::stop_time("t0", "s1", 2, "24:05:00", "24:05:00"),
        ],
    };
    let dataset = dataset(data, Vec::new());

    let planner = Planner::new(&dataset);
    let mut allocator = Allocator::new(&dataset.repository);
    let preference = RoutePreference::default();
    let result = planner
        .plan(
            &mut allocator,
            Coordinate::new(37.50, 127.00),
            Coordinate::new(37.51, 127.02),
            Time::from_hms("23:50:00").unwrap(),
            &preference,
            None,
        )
        .expect("a trip departing before midnight and arriving after it should be found");

    assert!(result.journeys.iter().any(|journey| journey.segments.iter().any(|segment| segment.transit_route_id().is_some())));
}

#[test]
fn an_already_expired_deadline_still_returns_direct_mobility_candidates() {
    // direct_mobility_candidates is computed unconditionally before the
    // deadline is ever consulted, so a plan call with a deadline in the
    // past still returns a direct ride if one exists, while the RAPTOR-backed
    // transit search it runs alongside (strategy is not mobility_only here)
    // gets preempted and reports timed_out.
    let origin = Coordinate::new(37.40, 126.90);
    let destination = Coordinate::new(37.475, 126.975);

    let data = GtfsData {
        stops: vec![common::stop("s0", "Near Origin", 37.4003, 126.9003), common::stop("s1", "Near Dest", 37.4753, 126.9753)],
        routes: vec![common::route("r0", "1", 3)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "s0", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "s1", 2, "08:30:00", "08:30:00"),
        ],
    };
    let vehicles = vec![
        common::vehicle("bike-origin", MobilityMode::Bike, 37.4002, 126.9002),
        common::vehicle("bike-dest", MobilityMode::Bike, 37.4752, 126.9752),
    ];
    let dataset = dataset(data, vehicles);

    let origin_zone = dataset.repository.zone_grid().zone_of(&origin);
    let dest_zone = dataset.repository.zone_grid().zone_of(&destination);
    let zone_distance = dataset.repository.zone_grid().zone_distance(origin_zone, dest_zone);
    assert_ne!(zone_distance, 0, "fixture must not collapse to mobility_only, or the RAPTOR search never runs");

    let planner = Planner::new(&dataset);
    let mut allocator = Allocator::new(&dataset.repository);
    let preference = RoutePreference::default();
    let expired = Instant::now() - StdDuration::from_secs(1);

    let result = planner
        .plan(&mut allocator, origin, destination, Time::from_hms("08:00:00").unwrap(), &preference, Some(expired))
        .expect("the direct mobility candidate computed ahead of the RAPTOR search should still surface");

    assert!(!result.journeys.is_empty());
    assert!(result.timed_out, "the expired deadline should have preempted the transit search");
}
