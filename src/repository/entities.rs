use std::sync::Arc;

use crate::shared::{
    geo::{Coordinate, Distance},
    time::{Duration, Time},
};

/// Categorizes the specific nature of a transit stop location.
#[derive(Debug, Default, Clone)]
pub enum LocationType {
    /// A standard bus stop or platform.
    #[default]
    Stop,
    /// A specific platform within a larger station.
    Platform {
        /// ID of the parent station.
        parent_station: Arc<str>,
        /// The alphanumeric code for the platform (e.g., "4B").
        platform_code: Arc<str>,
    },
    /// A major transit hub or rail station containing multiple platforms.
    Station,
    /// A specific physical entrance to a station.
    Entrance(Arc<str>),
    /// A generic node in the transit network (often used for logical junctions).
    Node,
    /// A specific designated boarding point.
    Boarding,
}

/// A physical point where passengers can board or alight from a scheduled vehicle.
///
/// Micro-mobility vehicles are **not** stops; see [`crate::mobility::MobilityVehicle`].
#[derive(Debug, Default, Clone)]
pub struct Stop {
    /// The global internal index for this stop.
    pub index: u32,
    /// Unique external identifier for the stop.
    pub id: Arc<str>,
    /// Human-readable name (e.g., "Main St & 4th Ave").
    pub name: Arc<str>,
    pub coordinate: Coordinate,
    /// The specific feed-level location classification.
    pub location_type: LocationType,
    /// Index of the parent station, if this stop is a platform/entrance of one.
    pub parent_index: Option<u32>,
}

#[derive(Debug, Default, Clone)]
pub enum Timepoint {
    #[default]
    Approximate,
    Exact,
}

#[derive(Debug, Default, Clone)]
pub enum StopAccessType {
    #[default]
    Regularly,
    NoneAvailable,
    AgencyArrange,
    DriverArrange,
}

/// Individual event within a trip where a vehicle calls at a stop.
#[derive(Debug, Default, Clone)]
pub struct StopTime {
    /// Global internal index of this stop-time record.
    pub index: u32,
    /// Internal index of the parent [`Trip`].
    pub trip_idx: u32,
    /// Internal index of the associated [`Stop`].
    pub stop_idx: u32,
    /// The order of this stop within the trip (starts from 1).
    pub sequence: u16,
    /// Pointer to the full range of stop times for the parent trip.
    pub slice: StopTimeSlice,
    /// Zero-based position of this stop within its specific trip.
    pub internal_idx: u32,
    /// Scheduled arrival time (stored as seconds since midnight, may exceed 86400).
    pub arrival_time: Time,
    /// Scheduled departure time (stored as seconds since midnight, may exceed 86400).
    pub departure_time: Time,
    /// Destination shown to passengers when at this stop.
    pub headsign: Option<Arc<str>>,
    /// Cumulative distance traveled along the trip.
    pub dist_traveled: Option<Distance>,
    /// Policy for passenger boarding (Regular, No Pickup, etc.).
    pub pickup_type: StopAccessType,
    /// Policy for passenger alighting.
    pub drop_off_type: StopAccessType,
    /// Indicates if times are exact or estimates.
    pub timepoint: Timepoint,
}

/// Metadata describing a contiguous range within the global `stop_times` array.
#[derive(Default, Debug, Clone, Copy)]
pub struct StopTimeSlice {
    /// The index where the trip's stop-times begin.
    pub start_idx: u32,
    /// The total number of stops in the trip.
    pub count: u32,
}

/// A foot-walk connection between two stops, either explicit (feed-provided) or
/// derived from the spatial index at ingest time.
#[derive(Debug, Default, Clone)]
pub struct Transfer {
    pub from_stop_idx: u32,
    pub to_stop_idx: u32,
    /// If present, this transfer is only valid when arriving on this specific trip.
    pub from_trip_idx: Option<u32>,
    /// If present, this transfer is only valid when departing on this specific trip.
    pub to_trip_idx: Option<u32>,
    /// The minimum time required to successfully complete this transfer, when the
    /// feed supplies an explicit override instead of a derived walk time.
    pub min_transfer_time: Option<Duration>,
}

/// A specific journey taken by a vehicle through a sequence of stops.
#[derive(Debug, Default, Clone)]
pub struct Trip {
    pub index: u32,
    pub id: Arc<str>,
    /// Pointer to the parent [`Route`].
    pub route_idx: u32,
    pub headsign: Option<Arc<str>>,
    pub short_name: Option<Arc<str>>,
}

/// Transport mode carried by a [`Route`]. Only `Bus` and `Metro` come from the
/// transit feed; micro-mobility lives entirely in [`crate::mobility`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    #[default]
    Bus,
    Metro,
}

impl From<i32> for RouteMode {
    fn from(value: i32) -> Self {
        match value {
            1 | 2 => RouteMode::Metro,
            _ => RouteMode::Bus,
        }
    }
}

/// A grouping of trips that are displayed to riders under a single name (e.g., "Bus 146").
#[derive(Debug, Default, Clone)]
pub struct Route {
    pub index: u32,
    pub id: Arc<str>,
    pub short_name: Option<Arc<str>>,
    pub long_name: Option<Arc<str>>,
    pub mode: RouteMode,
}

impl Route {
    pub fn label(&self) -> String {
        match (&self.short_name, &self.long_name) {
            (Some(short), _) => short.to_string(),
            (None, Some(long)) => long.to_string(),
            (None, None) => self.id.to_string(),
        }
    }
}

/// An optimized route structure strictly for the RAPTOR algorithm.
///
/// Unlike a standard [`Route`], a `RaptorRoute` guarantees that every trip
/// within it shares the *exact same stop sequence*; a [`Route`] whose trips
/// branch or whose stop sequence loops back on itself is split into one or
/// more of these at ingest time.
#[derive(Debug, Default, Clone)]
pub struct RaptorRoute {
    /// Internal index of this RAPTOR-specific route.
    pub index: u32,
    /// Pointer back to the display-level [`Route`].
    pub route_idx: u32,
    /// List of stop indices served by this route in order.
    pub stops: Arc<[u32]>,
    /// List of trip indices that follow this stop sequence, sorted by first departure.
    pub trips: Arc<[u32]>,
}
