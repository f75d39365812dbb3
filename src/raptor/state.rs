use crate::shared::{geo::Distance, time::Time};

/// A proposed improvement to a stop's label, produced during route scanning or
/// transfer relaxation and applied in bulk by [`super::Allocator::run_updates`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Update {
    pub stop_idx: u32,
    pub arrival_time: Time,
    pub walk: Distance,
    pub cost: u32,
    pub parent: Parent,
}

impl Update {
    pub fn new(stop_idx: u32, arrival_time: Time, walk: Distance, cost: u32, parent: Parent) -> Self {
        Self {
            stop_idx,
            arrival_time,
            walk,
            cost,
            parent,
        }
    }
}

/// One leg of a reconstructed path: which stop it came from, which one it
/// reaches, and the cumulative walk/cost carried by the label that produced it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Parent {
    pub from: u32,
    pub to: u32,
    pub parent_type: ParentType,
    pub departure_time: Time,
    pub arrival_time: Time,
    /// Cumulative walking distance of the label arriving at `to`.
    pub walk: Distance,
    /// Cumulative cost of the label arriving at `to`.
    pub cost: u32,
}

impl Parent {
    #[allow(clippy::too_many_arguments)]
    pub fn new_transit(
        from: u32,
        to: u32,
        trip: u32,
        departure_time: Time,
        arrival_time: Time,
        walk: Distance,
        cost: u32,
    ) -> Self {
        Self {
            from,
            to,
            parent_type: ParentType::Transit(trip),
            departure_time,
            arrival_time,
            walk,
            cost,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_transfer(
        from: u32,
        to: u32,
        departure_time: Time,
        arrival_time: Time,
        walk: Distance,
        cost: u32,
    ) -> Self {
        Self {
            from,
            to,
            parent_type: ParentType::Transfer,
            departure_time,
            arrival_time,
            walk,
            cost,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new_walk(
        from: u32,
        to: u32,
        departure_time: Time,
        arrival_time: Time,
        walk: Distance,
        cost: u32,
    ) -> Self {
        Self {
            from,
            to,
            parent_type: ParentType::Walk,
            departure_time,
            arrival_time,
            walk,
            cost,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ParentType {
    Transit(u32),
    Transfer,
    Walk,
}

impl ParentType {
    pub fn is_transit(&self) -> bool {
        matches!(self, ParentType::Transit(_))
    }
}

/// Tracks the target stop set and the current target-pruning bound: the best
/// arrival time known at any target stop, across all rounds so far.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub stops: Vec<u32>,
    pub tau_star: Time,
}

impl Target {
    pub fn new() -> Self {
        Self {
            stops: vec![],
            tau_star: crate::shared::time::MAX,
        }
    }

    pub fn clear(&mut self) {
        self.stops.clear();
        self.tau_star = crate::shared::time::MAX;
    }
}
