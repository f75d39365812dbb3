mod entities;
pub mod source;

pub use entities::*;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

use crate::{
    mobility::{MobilityVehicle, TariffTable},
    shared::geo::{Coordinate, Distance},
    spatial::{Neighbor, SpatialIndex},
    zone::{BoundingBox, ZoneGrid},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("dataset invariant violated: {0}")]
    DatasetInvariantViolated(String),
}

/// A read-only, memory-efficient data store containing all transit and
/// micro-mobility network information for one district.
///
/// The `Repository` acts as a flattened relational database, optimized for
/// high-performance pathfinding algorithms like RAPTOR. It uses `Box<[T]>`
/// instead of `Vec<T>` to minimize memory overhead and signal immutability
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    // --- Core Entities ---
    /// Global list of all physical transit stops or stations.
    pub stops: Box<[Stop]>,
    /// High-level transit routes (e.g., "Bus 42").
    pub routes: Box<[Route]>,
    /// Specialized route structures where every trip follows an identical stop sequence.
    /// Required for the RAPTOR algorithm's optimization passes.
    pub raptor_routes: Box<[RaptorRoute]>,
    /// Individual vehicle journeys occurring at specific times.
    pub trips: Box<[Trip]>,
    /// The specific arrival/departure events linking trips to stops.
    pub stop_times: Box<[StopTime]>,
    /// All known transfers, explicit or derived.
    pub transfers: Box<[Transfer]>,
    /// Docked bike stations and virtual micro-mobility cells.
    pub mobility_vehicles: Box<[MobilityVehicle]>,
    /// The district's extent, used by the zone grid.
    pub bounding_box: BoundingBox,
    /// Side length of the uniform zone grid tiling `bounding_box`.
    pub grid_size: u32,

    // --- Primary Key Lookups ---
    /// Maps a unique `Stop.id` string to its index within the `stops` slice.
    stop_lookup: HashMap<Arc<str>, u32>,
    /// Maps a unique `Trip.id` string to its index within the `trips` slice.
    trip_lookup: HashMap<Arc<str>, u32>,
    /// Maps a unique `Route.id` string to its index within the `routes` slice.
    route_lookup: HashMap<Arc<str>, u32>,

    // --- Spatial Indices (C1) ---
    stop_index: SpatialIndex,
    mobility_index: SpatialIndex,

    // --- Relationship Indicies (Adjacency Lists) ---
    /// Index mapping: `route_index -> [trip_index, ...]`.
    route_to_trips: Box<[Box<[u32]>]>,
    /// Index mapping: `trip_index -> route_index`.
    trip_to_route: Box<[u32]>,
    /// Index mapping: `stop_index -> [transfer_index, ...]`.
    pub(crate) stop_to_transfers: Box<[Box<[u32]>]>,
    /// Index mapping: `stop_index -> [trip_index, ...]`.
    stop_to_trips: Box<[Box<[u32]>]>,
    /// Defines the range within the `stop_times` slice that belongs to a specific trip.
    trip_to_stop_slice: Box<[StopTimeSlice]>,
    /// Implicit walk adjacency derived from the spatial index at ingest time.
    pub(crate) stop_to_walk_stop: Box<[Box<[u32]>]>,

    // --- RAPTOR Specialized Lookups ---
    /// Maps a standard route index to its corresponding `RaptorRoute` versions.
    route_to_raptors: Box<[Box<[u32]>]>,
    /// Maps a stop index to all `RaptorRoute` indices that serve it.
    pub(crate) stop_to_raptors: Box<[Box<[u32]>]>,
}

impl Repository {
    /// Creates a new, empty repository instance.
    pub fn new() -> Self {
        Default::default()
    }

    /// The uniform zone grid tiling this repository's bounding box.
    pub fn zone_grid(&self) -> ZoneGrid {
        ZoneGrid::new(self.bounding_box, self.grid_size)
    }

    // --- Primary Key Lookups Functions ---

    /// Retrieves a [`Stop`] by its string identifier `Stop.id`.
    /// Returns `None` if the ID does not exist.
    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        let stop_index = self.stop_lookup.get(id)?;
        Some(&self.stops[*stop_index as usize])
    }

    /// Retrieves a [`Trip`] by its string identifier `Trip.id`.
    /// Returns `None` if the ID does not exist.
    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        let trip_index = self.trip_lookup.get(id)?;
        Some(&self.trips[*trip_index as usize])
    }

    /// Retrieves a [`Route`] by its string identifier `Route.id`.
    /// Returns `None` if the ID does not exist.
    pub fn route_by_id(&self, id: &str) -> Option<&Route> {
        let index = self.route_lookup.get(id)?;
        Some(&self.routes[*index as usize])
    }

    // --- Relationship Indicies (Adjacency Lists) Functions ---

    /// Retrieves all outbound [`Transfer`] connections available from a specific [`Stop`] using it's index (`Stop.index`).
    pub fn transfers_by_stop_idx(&self, stop_idx: u32) -> Vec<&Transfer> {
        self.stop_to_transfers[stop_idx as usize]
            .iter()
            .map(|transfer_idx| &self.transfers[*transfer_idx as usize])
            .collect()
    }

    /// Finds all trips that call at a specific [`Stop`] using it's index (`Stop.index`).
    pub fn trips_by_stop_idx(&self, stop_idx: u32) -> Vec<&Trip> {
        self.stop_to_trips[stop_idx as usize]
            .iter()
            .map(|trip_idx| &self.trips[*trip_idx as usize])
            .collect()
    }

    /// Identifies which high-level [`Route`] a specific [`Trip`] belongs to using it's index (`Trip.index`).
    pub fn route_by_trip_idx(&self, trip_idx: u32) -> &Route {
        let route_idx = self.trip_to_route[trip_idx as usize];
        &self.routes[route_idx as usize]
    }

    /// Retrieves all scheduled trips for a specific route.
    pub fn trips_by_route_idx(&self, route_idx: u32) -> Vec<&Trip> {
        self.route_to_trips[route_idx as usize]
            .iter()
            .map(|trip_idx| &self.trips[*trip_idx as usize])
            .collect()
    }

    /// Retrieves the full schedule (arrival/departure times) for every trip on a route.
    pub fn stop_times_by_route_idx(&self, route_idx: u32) -> Vec<&[StopTime]> {
        self.route_to_trips[route_idx as usize]
            .iter()
            .map(|trip_idx| self.stop_times_by_trip_idx(*trip_idx))
            .collect()
    }

    /// Efficiently retrieves a slice of [`StopTime`] entries for a specific trip.
    ///
    /// This uses a pre-computed pointer slice (start/count) into the global
    /// `stop_times` array for $O(1)$ access.
    pub fn stop_times_by_trip_idx(&self, trip_idx: u32) -> &[StopTime] {
        let slice = self.trip_to_stop_slice[trip_idx as usize];
        let start = slice.start_idx as usize;
        let end = start + slice.count as usize;
        &self.stop_times[start..end]
    }

    // --- Spatial Queries (C1) ---

    /// All stops within `distance` of `coordinate`, nearest first.
    pub fn stops_by_coordinate(&self, coordinate: &Coordinate, distance: Distance) -> Vec<&Stop> {
        self.stop_index
            .within_radius(&self.stops, coordinate, distance)
            .into_iter()
            .map(|neighbor| &self.stops[neighbor.index as usize])
            .collect()
    }

    /// Stops within `distance` of `coordinate`, paired with their road distance.
    pub fn stop_neighbors(&self, coordinate: &Coordinate, distance: Distance) -> Vec<Neighbor> {
        self.stop_index.within_radius(&self.stops, coordinate, distance)
    }

    /// Mobility vehicles within `distance` of `coordinate`, paired with their road distance.
    pub fn mobility_neighbors(&self, coordinate: &Coordinate, distance: Distance) -> Vec<Neighbor> {
        self.mobility_index
            .within_radius(&self.mobility_vehicles, coordinate, distance)
    }

    // --- RAPTOR Specialized Lookups Functions ---

    /// Returns the optimized `RaptorRoute` variations for a given standard route.
    pub fn raptors_by_route_idx(&self, route_idx: u32) -> Vec<&RaptorRoute> {
        self.route_to_raptors[route_idx as usize]
            .iter()
            .map(|raptor_idx| &self.raptor_routes[*raptor_idx as usize])
            .collect()
    }

    /// Identifies which optimized RAPTOR routes pass through a specific stop.
    pub fn raptors_by_stop_idx(&self, stop_idx: u32) -> Vec<&RaptorRoute> {
        self.stop_to_raptors[stop_idx as usize]
            .iter()
            .map(|raptor_idx| &self.raptor_routes[*raptor_idx as usize])
            .collect()
    }

    /// Validates cross-referential invariants that ingestion cannot rule out
    /// while it is still accumulating indices. Called once at the end of
    /// `load_gtfs`; never re-checked mid-query.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        for stop in self.stops.iter() {
            if !self.bounding_box.contains(&stop.coordinate) {
                return Err(Error::DatasetInvariantViolated(format!(
                    "stop {} lies outside the district bounding box",
                    stop.id
                )));
            }
        }
        for trip in self.trips.iter() {
            let stop_times = self.stop_times_by_trip_idx(trip.index);
            let mut prev_departure = None;
            for stop_time in stop_times {
                if stop_time.arrival_time > stop_time.departure_time {
                    return Err(Error::DatasetInvariantViolated(format!(
                        "trip {} arrives after it departs at stop position {}",
                        trip.id, stop_time.internal_idx
                    )));
                }
                if let Some(prev) = prev_departure
                    && stop_time.arrival_time < prev
                {
                    return Err(Error::DatasetInvariantViolated(format!(
                        "trip {} has non-monotonic times at stop position {}",
                        trip.id, stop_time.internal_idx
                    )));
                }
                prev_departure = Some(stop_time.departure_time);
            }
        }
        Ok(())
    }
}
