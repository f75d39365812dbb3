use crate::{
    raptor::{
        Allocator, LazyBuffer, Parent, Update, find_earliest_trip, get_arrival_time,
        get_departure_time, time_to_walk, transfer_duration,
    },
    repository::{Repository, Trip},
    shared::time,
};
use rayon::prelude::*;

/// Explores all active routes and add any updates to the update buffer in the allocator.
/// This is the core of the k-th round: it propagates travel times by one additional "hop"
/// using only transit routes.
pub fn explore_routes(repository: &Repository, allocator: &mut Allocator) {
    let updates = allocator
        .active_mask
        .iter_ones()
        .par_bridge()
        .map_init(
            || LazyBuffer::new(32),
            |buffer, route_idx| {
                let p_idx = allocator.active[route_idx];

                let route = &repository.raptor_routes[route_idx];
                let mut active_trip: Option<&Trip> = None;
                let mut boarding_stop: u32 = u32::MAX;
                let mut boarding_p: usize = usize::MAX;
                let mut boarding_walk = crate::shared::geo::Distance::from_meters(0.0);
                let mut boarding_cost: u32 = 0;

                // Optimization: We only start scanning from the earliest stop that was
                // updated in the previous round (p_idx) to avoid redundant checks.
                for i in p_idx as usize..route.stops.len() {
                    let stop_idx = route.stops[i];
                    // PART A: Update arrival times
                    // If we are currently "on" a trip, check if it reaches this stop
                    // earlier than any path discovered in previous rounds.
                    if let Some(trip) = active_trip
                        && let arrival_time = get_arrival_time(repository, trip.index, i)
                        && arrival_time < allocator.tau_star[stop_idx as usize].unwrap_or(time::MAX)
                        && arrival_time < allocator.target.tau_star
                    {
                        buffer.push(Update::new(
                            stop_idx,
                            arrival_time,
                            boarding_walk,
                            boarding_cost,
                            Parent::new_transit(
                                boarding_stop,
                                stop_idx,
                                trip.index,
                                get_departure_time(repository, trip.index, boarding_p),
                                arrival_time,
                                boarding_walk,
                                boarding_cost,
                            ),
                        ));
                    }

                    // PART B: Trip Hopping
                    // Check if we can catch an even earlier trip. This happens if the
                    // arrival time at this stop from the PREVIOUS round is earlier
                    // than the departure of a trip on the current route.
                    let prev_label = allocator.prev_labels[stop_idx as usize].unwrap_or(time::MAX);
                    let current_trip_dep = active_trip
                        .map(|t| get_departure_time(repository, t.index, i))
                        .unwrap_or(time::MAX);

                    if prev_label <= current_trip_dep
                        && let Some(earlier_trip) =
                            find_earliest_trip(repository, route, i, prev_label)
                    {
                        // We found a better trip to board (or a fresh start for this route).
                        active_trip = Some(earlier_trip);
                        boarding_stop = stop_idx;
                        boarding_p = i;
                        boarding_walk = allocator.prev_walk[stop_idx as usize];
                        boarding_cost = allocator.prev_cost[stop_idx as usize];
                    }
                }
                buffer.swap()
            },
        )
        .flatten();
    allocator.updates.par_extend(updates);
}

/// Handles footpaths and transfers between stops.
/// In RAPTOR, transfers are processed after route exploration to ensure that
/// round k transit results can be used as the starting point for round k+1.
pub fn explore_transfers(repository: &Repository, allocator: &mut Allocator) {
    let updates = allocator
        .marked_stops
        .iter_ones()
        .par_bridge()
        .map_init(
            || LazyBuffer::<Update>::new(32),
            |buffer, stop_idx| {
                let departure_time = allocator.curr_labels[stop_idx].unwrap_or(time::MAX);
                let source_walk = allocator.curr_walk[stop_idx];
                let source_cost = allocator.curr_cost[stop_idx];

                // All the possible transfers
                repository.stop_to_transfers[stop_idx]
                    .iter()
                    .for_each(|transfer_idx| {
                        let transfer = &repository.transfers[*transfer_idx as usize];
                        let arrival_time = departure_time + transfer_duration(repository, transfer);
                        if arrival_time
                            < allocator.tau_star[transfer.to_stop_idx as usize].unwrap_or(time::MAX)
                            && arrival_time < allocator.target.tau_star
                        {
                            let from_stop = &repository.stops[stop_idx];
                            let to_stop = &repository.stops[transfer.to_stop_idx as usize];
                            let walk = source_walk
                                + from_stop.coordinate.network_distance(&to_stop.coordinate);
                            buffer.push(Update::new(
                                transfer.to_stop_idx,
                                arrival_time,
                                walk,
                                source_cost,
                                Parent::new_transfer(
                                    stop_idx as u32,
                                    transfer.to_stop_idx,
                                    departure_time,
                                    arrival_time,
                                    walk,
                                    source_cost,
                                ),
                            ));
                        }
                    });

                let current_stop = &repository.stops[stop_idx];
                repository.stop_to_walk_stop[stop_idx]
                    .iter()
                    .for_each(|next_stop_idx| {
                        let next_stop = &repository.stops[*next_stop_idx as usize];
                        let walking_distance = current_stop
                            .coordinate
                            .network_distance(&next_stop.coordinate);
                        let arrival_time = departure_time + time_to_walk(walking_distance);
                        if arrival_time
                            < allocator.tau_star[next_stop.index as usize].unwrap_or(time::MAX)
                            && arrival_time < allocator.target.tau_star
                        {
                            let walk = source_walk + walking_distance;
                            buffer.push(Update::new(
                                next_stop.index,
                                arrival_time,
                                walk,
                                source_cost,
                                Parent::new_walk(
                                    stop_idx as u32,
                                    next_stop.index,
                                    departure_time,
                                    arrival_time,
                                    walk,
                                    source_cost,
                                ),
                            ));
                        }
                    });
                buffer.swap()
            },
        )
        .flatten();
    allocator.updates.par_extend(updates);
}
