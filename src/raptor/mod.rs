mod allocator;
mod discovery;
mod explorer;
mod path;
mod state;

use std::collections::HashMap;
use std::mem;
use std::time::Instant;

pub use allocator::*;
pub(crate) use discovery::*;
pub(crate) use path::*;
pub(crate) use state::*;

use crate::{
    raptor::explorer::{explore_routes, explore_transfers},
    repository::Repository,
    shared::{
        geo::Distance,
        time::{self, Time},
    },
};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum Error {
    #[error("a route was found but the back-pointer chain failed to reconstruct it")]
    FailedToBuildRoute,
}

/// A labeled entry point into the transit graph: a stop the traveler can
/// already reach, with the arrival time and accumulated walk/cost that got
/// them there before RAPTOR starts rounds.
#[derive(Debug, Clone, Copy)]
pub struct Source {
    pub stop_idx: u32,
    pub arrival_time: Time,
    pub walk: Distance,
    pub cost: u32,
}

impl Source {
    pub fn new(stop_idx: u32, arrival_time: Time, walk: Distance, cost: u32) -> Self {
        Self { stop_idx, arrival_time, walk, cost }
    }
}

/// One non-dominated label produced for a target stop: how to get there, how
/// many transit legs it took, and the walk/cost it cost to do so.
#[derive(Debug, Clone)]
pub struct Label {
    pub arrival_time: Time,
    pub transfers: u32,
    pub walk: Distance,
    pub cost: u32,
    pub path: Vec<Parent>,
}

fn dominates(a: &Label, b: &Label) -> bool {
    let le = a.arrival_time <= b.arrival_time
        && a.transfers <= b.transfers
        && a.walk <= b.walk
        && a.cost <= b.cost;
    let lt = a.arrival_time < b.arrival_time
        || a.transfers < b.transfers
        || a.walk < b.walk
        || a.cost < b.cost;
    le && lt
}

fn dominant_labels(mut labels: Vec<Label>) -> Vec<Label> {
    labels.sort_by(|a, b| a.arrival_time.partial_cmp(&b.arrival_time).unwrap());
    let mut result: Vec<Label> = Vec::new();
    'outer: for label in labels {
        for kept in &result {
            if dominates(kept, &label) {
                continue 'outer;
            }
        }
        result.retain(|kept| !dominates(&label, kept));
        result.push(label);
    }
    result
}

/// The execution engine for the Round-Based Public Transit Routing (RAPTOR) algorithm.
///
/// This struct only holds a reference to the underlying transit [`Repository`];
/// all per-query state lives in the caller-supplied [`Allocator`] so it can be
/// reused across many searches without re-allocating.
///
/// # Search Logic
/// RAPTOR explores the network in "rounds." Round `K` finds all stops reachable
/// with exactly `K` transit legs from any of the query's sources.
pub struct Raptor<'a> {
    repository: &'a Repository,
}

/// Default cap on the number of transit legs (rounds) a search will take.
pub const DEFAULT_K_MAX: usize = 4;

/// Result of a [`Raptor::search`] call: the dominated-free labels discovered
/// per target stop, plus whether the search was cut short by its deadline.
#[derive(Debug, Default)]
pub struct SearchResult {
    pub labels: HashMap<u32, Vec<Label>>,
    /// `true` if the deadline expired before the search would otherwise have
    /// terminated. The labels present are best-so-far, never invalid.
    pub timed_out: bool,
}

impl<'a> Raptor<'a> {
    pub fn new(repository: &'a Repository) -> Self {
        Self { repository }
    }

    /// Runs a multi-source, multi-target RAPTOR search and returns, for each
    /// target stop, the dominated-free set of labels discovered across rounds
    /// `0..=k_max`.
    ///
    /// `k_max` is clamped to the allocator's `MAX_ROUNDS - 1` so a caller can
    /// never overrun the pre-sized parent matrix. `deadline`, when set, is
    /// checked at the top of every round (which doubles as the start of that
    /// round's route scan); once it passes, the search stops and returns
    /// best-so-far labels with `timed_out` set.
    pub fn search(
        &self,
        allocator: &mut Allocator,
        sources: &[Source],
        target_stops: &[u32],
        k_max: usize,
        deadline: Option<Instant>,
    ) -> SearchResult {
        allocator.reset();
        let k_max = k_max.min(MAX_ROUNDS - 1);

        sources.iter().for_each(|source| {
            allocator.marked_stops.set(source.stop_idx as usize, true);
            allocator.curr_labels[source.stop_idx as usize] = Some(source.arrival_time);
            allocator.curr_walk[source.stop_idx as usize] = source.walk;
            allocator.curr_cost[source.stop_idx as usize] = source.cost;
            allocator.tau_star[source.stop_idx as usize] = Some(source.arrival_time);
        });
        allocator.target.stops = target_stops.to_vec();
        allocator.target.tau_star = time::MAX;

        let mut rounds_completed = 0;
        let mut round = 0;
        let mut timed_out = false;
        loop {
            if round > k_max {
                warn!("Hit round limit!");
                break;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                warn!("Deadline exceeded at round {round}");
                timed_out = true;
                break;
            }
            allocator.swap_labels();

            if allocator.marked_stops.not_any() {
                break;
            }

            let mut marked_stops = mem::take(&mut allocator.marked_stops);

            allocator.active_mask.fill(false);
            marked_stops.iter_ones().for_each(|stop_idx| {
                // We look at all the routes that serve a stop. For each route
                // that serves it we keep the earliest stop position among all
                // marked stops, so the scan only walks each route once.
                routes_serving_stop(self.repository, stop_idx as u32, allocator);
                for route in allocator.routes_serving_stops.iter() {
                    let r_idx = route.route_idx as usize;
                    let p_idx = route.idx_in_route;
                    let p_idx_to_beat = allocator
                        .active_mask
                        .get(r_idx)
                        .map(|_| allocator.active[r_idx])
                        .unwrap_or(u32::MAX);
                    if p_idx < p_idx_to_beat {
                        allocator.active[r_idx] = p_idx;
                        allocator.active_mask.set(r_idx, true);
                    }
                }
            });

            marked_stops.fill(false);
            allocator.marked_stops = mem::take(&mut marked_stops);

            explore_routes(self.repository, allocator);
            allocator.run_updates(round);

            explore_transfers(self.repository, allocator);
            allocator.run_updates(round);

            allocator
                .target
                .stops
                .iter()
                .filter_map(|stop_idx| allocator.tau_star[*stop_idx as usize])
                .for_each(|tau_star| {
                    if tau_star < allocator.target.tau_star {
                        allocator.target.tau_star = tau_star;
                    }
                });

            rounds_completed = round + 1;
            round += 1;
        }

        let labels = target_stops
            .iter()
            .map(|&stop_idx| (stop_idx, self.collect_labels(allocator, sources, stop_idx, rounds_completed)))
            .collect();

        SearchResult { labels, timed_out }
    }

    fn collect_labels(
        &self,
        allocator: &Allocator,
        sources: &[Source],
        target_stop: u32,
        rounds_completed: usize,
    ) -> Vec<Label> {
        let mut candidates = Vec::new();

        if let Some(source) = sources.iter().find(|s| s.stop_idx == target_stop) {
            candidates.push(Label {
                arrival_time: source.arrival_time,
                transfers: 0,
                walk: source.walk,
                cost: source.cost,
                path: Vec::new(),
            });
        }

        for round in 0..rounds_completed {
            if allocator.get_parents(round)[target_stop as usize].is_some()
                && let Ok(path) = backtrack(self.repository, allocator, target_stop, round)
            {
                let last = path.last().expect("backtrack never returns an empty path");
                let transfers = path.iter().filter(|p| p.parent_type.is_transit()).count() as u32;
                candidates.push(Label {
                    arrival_time: last.arrival_time,
                    transfers,
                    walk: last.walk,
                    cost: last.cost,
                    path,
                });
            }
        }

        dominant_labels(candidates)
    }
}
