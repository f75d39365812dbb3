use std::path::PathBuf;

use crossbeam_queue::SegQueue;
use tokio::sync::RwLock;
use transect::{Dataset, raptor::Allocator};

/// Shared server state: the loaded routing dataset plus a pool of reusable
/// RAPTOR allocators, so concurrent `/plan` requests don't each pay a fresh
/// allocation for their per-query label arrays.
pub struct AppState {
    pub gtfs_data_path: PathBuf,
    pub dataset: RwLock<Option<Dataset>>,
    pub allocators: SegQueue<Allocator>,
}

impl AppState {
    /// Checks out an allocator sized for the currently loaded dataset, or
    /// builds a fresh one if the pool is empty.
    pub fn checkout_allocator(&self, dataset: &Dataset) -> Allocator {
        self.allocators.pop().unwrap_or_else(|| Allocator::new(&dataset.repository))
    }

    pub fn return_allocator(&self, allocator: Allocator) {
        self.allocators.push(allocator);
    }
}
