//! Shared fixture builders for the integration tests below. Builds small,
//! hand-written GTFS-shaped feeds directly as `GtfsData` rather than reading
//! CSV files, so each test stays self-contained and deterministic.

use transect::gtfs::GtfsData;
use transect::gtfs::models::{GtfsRoute, GtfsStop, GtfsStopTime, GtfsTransfer, GtfsTrip};
use transect::mobility::MobilityVehicleRecord;
use transect::repository::Repository;
use transect::shared::geo::Coordinate;
use transect::zone::BoundingBox;

pub fn stop(id: &str, name: &str, lat: f32, lon: f32) -> GtfsStop {
    GtfsStop {
        stop_id: id.into(),
        stop_name: name.into(),
        stop_lat: lat,
        stop_lon: lon,
        location_type: None,
        parent_station: None,
        platform_code: None,
    }
}

pub fn route(id: &str, short_name: &str, route_type: i32) -> GtfsRoute {
    GtfsRoute {
        route_id: id.into(),
        agency_id: None,
        route_short_name: Some(short_name.into()),
        route_long_name: None,
        route_type,
        route_desc: None,
    }
}

pub fn trip(route_id: &str, trip_id: &str) -> GtfsTrip {
    GtfsTrip {
        route_id: route_id.into(),
        service_id: "weekday".into(),
        trip_id: trip_id.into(),
        trip_headsign: None,
        trip_short_name: None,
        direction_id: None,
    }
}

pub fn stop_time(trip_id: &str, stop_id: &str, sequence: u16, arrival: &str, departure: &str) -> GtfsStopTime {
    GtfsStopTime {
        trip_id: trip_id.into(),
        arrival_time: arrival.into(),
        departure_time: departure.into(),
        stop_id: stop_id.into(),
        stop_sequence: sequence,
        stop_headsign: None,
        pickup_type: 0,
        drop_off_type: 0,
        shape_dist_traveled: None,
        timepoint: None,
    }
}

pub fn transfer(from_stop_id: &str, to_stop_id: &str) -> GtfsTransfer {
    GtfsTransfer {
        from_stop_id: from_stop_id.into(),
        to_stop_id: to_stop_id.into(),
        transfer_type: "2".into(),
        min_transfer_time: None,
        from_trip_id: None,
        to_trip_id: None,
    }
}

pub fn vehicle(id: &str, mode: transect::mobility::MobilityMode, lat: f32, lon: f32) -> MobilityVehicleRecord {
    MobilityVehicleRecord {
        id: id.into(),
        mode,
        lat,
        lon,
        capacity: 4,
    }
}

/// A district-scale bounding box wide enough to host the multi-zone planner
/// scenarios (roughly 33km tall, 26km wide at this latitude).
pub fn district_bounding_box() -> BoundingBox {
    BoundingBox {
        lat_min: 37.40,
        lat_max: 37.70,
        lon_min: 126.90,
        lon_max: 127.20,
    }
}

pub fn district_grid_size() -> u32 {
    6
}

pub fn build_repository(
    data: GtfsData,
    mobility_vehicles: Vec<MobilityVehicleRecord>,
    bounding_box: BoundingBox,
    grid_size: u32,
) -> Result<Repository, transect::repository::Error> {
    Repository::new().load_gtfs(data, mobility_vehicles, bounding_box, grid_size)
}

#[allow(dead_code)]
pub fn coordinate(lat: f32, lon: f32) -> Coordinate {
    Coordinate::new(lat, lon)
}
