//! Exercises `Repository::load_gtfs` directly: RAPTOR route splitting,
//! reference validation, and the bounding-box/monotone-time invariants
//! checked once at load time.

mod common;

use transect::gtfs::GtfsData;
use transect::repository::Error as RepositoryError;

#[test]
fn branching_route_splits_into_distinct_raptor_routes() {
    let data = GtfsData {
        stops: vec![
            common::stop("s0", "Origin", 37.50, 127.00),
            common::stop("s1", "Junction", 37.51, 127.01),
            common::stop("s2", "Branch A End", 37.52, 127.02),
            common::stop("s3", "Branch B End", 37.52, 127.05),
        ],
        routes: vec![common::route("r0", "146", 3)],
        trips: vec![common::trip("r0", "t0"), common::trip("r0", "t1")],
        transfers: Vec::new(),
        stop_times: vec![
            // t0: s0 -> s1 -> s2 (branch A)
            common::stop_time("t0", "s0", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "s1", 2, "08:05:00", "08:05:00"),
            common::stop_time("t0", "s2", 3, "08:10:00", "08:10:00"),
            // t1: s0 -> s1 -> s3 (branch B): same leading stops, diverging tail
            common::stop_time("t1", "s0", 1, "08:15:00", "08:15:00"),
            common::stop_time("t1", "s1", 2, "08:20:00", "08:20:00"),
            common::stop_time("t1", "s3", 3, "08:25:00", "08:25:00"),
        ],
    };

    let repository = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .expect("valid fixture should load");

    let route = repository.route_by_id("r0").unwrap();
    let raptor_routes = repository.raptors_by_route_idx(route.index);
    assert_eq!(
        raptor_routes.len(),
        2,
        "trips with diverging stop sequences must split into distinct RaptorRoutes"
    );

    let signatures: Vec<Vec<u32>> = raptor_routes.iter().map(|r| r.stops.to_vec()).collect();
    assert_ne!(signatures[0], signatures[1]);
}

#[test]
fn looping_route_also_splits_by_signature() {
    // A loop line: the outbound leg and the return leg serve the same stops
    // but in reverse order, which is already a distinct signature.
    let data = GtfsData {
        stops: vec![
            common::stop("a", "A", 37.50, 127.00),
            common::stop("b", "B", 37.51, 127.01),
            common::stop("c", "C", 37.52, 127.02),
        ],
        routes: vec![common::route("loop", "Loop", 3)],
        trips: vec![common::trip("loop", "out"), common::trip("loop", "back")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("out", "a", 1, "08:00:00", "08:00:00"),
            common::stop_time("out", "b", 2, "08:05:00", "08:05:00"),
            common::stop_time("out", "c", 3, "08:10:00", "08:10:00"),
            common::stop_time("back", "c", 1, "08:15:00", "08:15:00"),
            common::stop_time("back", "b", 2, "08:20:00", "08:20:00"),
            common::stop_time("back", "a", 3, "08:25:00", "08:25:00"),
        ],
    };

    let repository = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .expect("valid fixture should load");

    let route = repository.route_by_id("loop").unwrap();
    assert_eq!(repository.raptors_by_route_idx(route.index).len(), 2);
}

#[test]
fn trip_referencing_unknown_route_is_rejected() {
    let data = GtfsData {
        stops: vec![common::stop("s0", "Origin", 37.50, 127.00)],
        routes: vec![common::route("r0", "146", 3)],
        trips: vec![common::trip("does-not-exist", "t0")],
        transfers: Vec::new(),
        stop_times: Vec::new(),
    };

    let err = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .expect_err("a trip referencing an unknown route must fail to load");

    assert!(matches!(err, RepositoryError::DatasetInvariantViolated(_)));
}

#[test]
fn transfer_referencing_unknown_stop_is_rejected() {
    let data = GtfsData {
        stops: vec![common::stop("s0", "Origin", 37.50, 127.00)],
        routes: Vec::new(),
        trips: Vec::new(),
        transfers: vec![common::transfer("s0", "nowhere")],
        stop_times: Vec::new(),
    };

    let err = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .expect_err("a transfer referencing an unknown stop must fail to load");

    assert!(matches!(err, RepositoryError::DatasetInvariantViolated(_)));
}

#[test]
fn stop_outside_bounding_box_fails_validation() {
    let data = GtfsData {
        stops: vec![common::stop("s0", "Outside", 10.0, 10.0)],
        routes: Vec::new(),
        trips: Vec::new(),
        transfers: Vec::new(),
        stop_times: Vec::new(),
    };

    let err = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .expect_err("a stop outside the district bounding box must fail validation");

    assert!(matches!(err, RepositoryError::DatasetInvariantViolated(_)));
}

#[test]
fn non_monotonic_stop_times_fail_validation() {
    let data = GtfsData {
        stops: vec![
            common::stop("a", "A", 37.50, 127.00),
            common::stop("b", "B", 37.51, 127.01),
        ],
        routes: vec![common::route("r0", "146", 3)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            // A vehicle that arrives at b before it departs a.
            common::stop_time("t0", "a", 1, "08:10:00", "08:10:00"),
            common::stop_time("t0", "b", 2, "08:05:00", "08:05:00"),
        ],
    };

    let err = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .expect_err("non-monotonic stop times must fail validation");

    assert!(matches!(err, RepositoryError::DatasetInvariantViolated(_)));
}

#[test]
fn mobility_vehicles_load_without_a_gtfs_feed() {
    let data = GtfsData::default();
    let vehicles = vec![common::vehicle(
        "bike-1",
        transect::mobility::MobilityMode::Bike,
        37.50,
        127.00,
    )];

    let repository = common::build_repository(
        data,
        vehicles,
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .expect("an empty transit feed with a mobility sidecar should still load");

    assert_eq!(repository.mobility_vehicles.len(), 1);
    assert_eq!(repository.mobility_vehicles[0].id.as_ref(), "bike-1");
}
