use tracing::trace;

use crate::{
    raptor::{self, Allocator, Parent},
    repository::Repository,
};

/// Walks the parent pointers backwards from `target_stop` at `target_round` down
/// to a stop with no parent (the query's origin), then reverses the legs so the
/// returned path reads origin-to-destination.
pub fn backtrack(
    repository: &Repository,
    allocator: &Allocator,
    target_stop: u32,
    target_round: usize,
) -> Result<Vec<Parent>, raptor::Error> {
    let mut path: Vec<Parent> = Vec::new();
    let mut current_stop = target_stop;
    let mut current_round = target_round;

    loop {
        let stop = &repository.stops[current_stop as usize];
        trace!(
            "Looking at stop: [{}] {} in round {current_round}",
            stop.id, stop.name
        );
        let Some(parent) = &allocator.get_parents(current_round)[current_stop as usize] else {
            break;
        };
        path.push(*parent);
        current_stop = parent.from;

        // A transit leg consumes a round; transfers and walks do not.
        if parent.parent_type.is_transit() {
            if current_round == 0 {
                break;
            }
            current_round -= 1;
        }
    }

    path.reverse();

    if path.is_empty() {
        return Err(raptor::Error::FailedToBuildRoute);
    }

    Ok(path)
}
