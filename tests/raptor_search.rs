//! Exercises the RAPTOR core directly: single-leg and multi-round transit
//! journeys, and transfers completed via the spatially-derived walk
//! adjacency rather than an explicit GTFS `transfers.txt` row.

mod common;

use transect::gtfs::GtfsData;
use transect::raptor::{Allocator, Raptor, Source, DEFAULT_K_MAX};
use transect::shared::geo::Distance;
use transect::shared::time::Time;

#[test]
fn direct_single_route_journey_is_found() {
    let data = GtfsData {
        stops: vec![
            common::stop("a", "A", 37.50, 127.00),
            common::stop("b", "B", 37.51, 127.02),
            common::stop("c", "C", 37.52, 127.04),
        ],
        routes: vec![common::route("r0", "146", 3)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "a", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "b", 2, "08:10:00", "08:10:00"),
            common::stop_time("t0", "c", 3, "08:20:00", "08:20:00"),
        ],
    };
    let repository = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .unwrap();

    let a = repository.stop_by_id("a").unwrap().index;
    let c = repository.stop_by_id("c").unwrap().index;

    let mut allocator = Allocator::new(&repository);
    let source = Source::new(a, Time::from_hms("08:00:00").unwrap(), Distance::from_meters(0.0), 0);
    let result = Raptor::new(&repository).search(&mut allocator, &[source], &[c], DEFAULT_K_MAX, None);

    assert!(!result.timed_out);
    let labels = result.labels.get(&c).expect("target stop must have an entry");
    assert!(!labels.is_empty());
    let best = labels.iter().min_by_key(|l| l.arrival_time.as_seconds()).unwrap();
    assert_eq!(best.arrival_time, Time::from_hms("08:20:00").unwrap());
    assert_eq!(best.transfers, 1);
}

#[test]
fn multi_round_journey_hops_across_two_routes_sharing_a_stop() {
    let data = GtfsData {
        stops: vec![
            common::stop("a", "A", 37.50, 127.00),
            common::stop("b", "B", 37.51, 127.02),
            common::stop("c", "C", 37.52, 127.04),
        ],
        routes: vec![common::route("r0", "146", 3), common::route("r1", "200", 3)],
        trips: vec![common::trip("r0", "t0"), common::trip("r1", "t1")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "a", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "b", 2, "08:10:00", "08:10:00"),
            common::stop_time("t1", "b", 1, "08:15:00", "08:15:00"),
            common::stop_time("t1", "c", 2, "08:25:00", "08:25:00"),
        ],
    };
    let repository = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .unwrap();

    let a = repository.stop_by_id("a").unwrap().index;
    let c = repository.stop_by_id("c").unwrap().index;

    let mut allocator = Allocator::new(&repository);
    let source = Source::new(a, Time::from_hms("08:00:00").unwrap(), Distance::from_meters(0.0), 0);
    let result = Raptor::new(&repository).search(&mut allocator, &[source], &[c], DEFAULT_K_MAX, None);

    let labels = result.labels.get(&c).expect("target stop must have an entry");
    let best = labels.iter().min_by_key(|l| l.arrival_time.as_seconds()).unwrap();
    assert_eq!(best.arrival_time, Time::from_hms("08:25:00").unwrap());
    assert_eq!(best.transfers, 2, "two distinct boardings are required to reach C");
}

#[test]
fn transfer_completed_via_derived_walk_adjacency() {
    // b and b_prime are ~110m apart (well inside the walk-adjacency radius)
    // but never appear together on any trip and have no explicit transfer row.
    let data = GtfsData {
        stops: vec![
            common::stop("a", "A", 37.50, 127.00),
            common::stop("b", "B", 37.51, 127.02),
            common::stop("b_prime", "B'", 37.5109, 127.02),
            common::stop("c", "C", 37.52, 127.04),
        ],
        routes: vec![common::route("r0", "146", 3), common::route("r1", "200", 3)],
        trips: vec![common::trip("r0", "t0"), common::trip("r1", "t1")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "a", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "b", 2, "08:10:00", "08:10:00"),
            common::stop_time("t1", "b_prime", 1, "08:12:00", "08:12:00"),
            common::stop_time("t1", "c", 2, "08:22:00", "08:22:00"),
        ],
    };
    let repository = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .unwrap();

    let a = repository.stop_by_id("a").unwrap().index;
    let c = repository.stop_by_id("c").unwrap().index;

    let mut allocator = Allocator::new(&repository);
    let source = Source::new(a, Time::from_hms("08:00:00").unwrap(), Distance::from_meters(0.0), 0);
    let result = Raptor::new(&repository).search(&mut allocator, &[source], &[c], DEFAULT_K_MAX, None);

    let labels = result.labels.get(&c).expect("target stop must have an entry");
    assert!(
        !labels.is_empty(),
        "the derived stop-to-walk-stop adjacency should bridge b and b_prime"
    );
    let best = labels.iter().min_by_key(|l| l.arrival_time.as_seconds()).unwrap();
    assert_eq!(best.arrival_time, Time::from_hms("08:22:00").unwrap());
}

#[test]
fn an_expired_deadline_stops_the_search_before_it_completes() {
    let data = GtfsData {
        stops: vec![
            common::stop("a", "A", 37.50, 127.00),
            common::stop("b", "B", 37.51, 127.02),
            common::stop("c", "C", 37.52, 127.04),
        ],
        routes: vec![common::route("r0", "146", 3)],
        trips: vec![common::trip("r0", "t0")],
        transfers: Vec::new(),
        stop_times: vec![
            common::stop_time("t0", "a", 1, "08:00:00", "08:00:00"),
            common::stop_time("t0", "b", 2, "08:10:00", "08:10:00"),
            common::stop_time("t0", "c", 3, "08:20:00", "08:20:00"),
        ],
    };
    let repository = common::build_repository(
        data,
        Vec::new(),
        common::district_bounding_box(),
        common::district_grid_size(),
    )
    .unwrap();

    let a = repository.stop_by_id("a").unwrap().index;
    let c = repository.stop_by_id("c").unwrap().index;

    let mut allocator = Allocator::new(&repository);
    let source = Source::new(a, Time::from_hms("08:00:00").unwrap(), Distance::from_meters(0.0), 0);
    let already_past = std::time::Instant::now() - std::time::Duration::from_secs(1);
    let result = Raptor::new(&repository).search(&mut allocator, &[source], &[c], DEFAULT_K_MAX, Some(already_past));

    assert!(result.timed_out);
    assert!(result.labels.get(&c).map(|labels| labels.is_empty()).unwrap_or(true));
}
