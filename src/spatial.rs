//! Spatial Index (C1): a uniform grid-cell bucket index, generic over any
//! entity with a coordinate. Used for both transit stops and mobility
//! vehicles (one instance of each, never mixed).
//!
//! This is the same cell-bucketing strategy [`crate::repository::Repository`]
//! uses internally for its `stops_by_coordinate` query, pulled out into a
//! standalone, reusable structure.

use rayon::prelude::*;
use std::collections::HashMap;

use crate::shared::geo::{AVERAGE_STOP_DISTANCE, Cell, Coordinate, Distance};

/// Anything the spatial index can bucket and return by reference.
pub trait Located {
    fn index(&self) -> u32;
    fn coordinate(&self) -> Coordinate;
}

impl Located for crate::repository::Stop {
    fn index(&self) -> u32 {
        self.index
    }
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

impl Located for crate::mobility::MobilityVehicle {
    fn index(&self) -> u32 {
        self.index
    }
    fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

/// A query result: the entity's index and its road/network distance from the query point.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub index: u32,
    pub distance: Distance,
}

/// Grid-bucket spatial index built once over an immutable entity slice.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    buckets: HashMap<Cell, Box<[u32]>>,
}

impl SpatialIndex {
    pub fn build<T: Located + Sync>(entities: &[T]) -> Self {
        let mut buckets: HashMap<Cell, Vec<u32>> = HashMap::new();
        for entity in entities {
            buckets
                .entry(entity.coordinate().to_cell())
                .or_default()
                .push(entity.index());
        }
        Self {
            buckets: buckets
                .into_iter()
                .map(|(cell, idxs)| (cell, idxs.into_boxed_slice()))
                .collect(),
        }
    }

    /// Returns every indexed entity within `radius` of `origin`, nearest first.
    pub fn within_radius<T: Located + Sync>(
        &self,
        entities: &[T],
        origin: &Coordinate,
        radius: Distance,
    ) -> Vec<Neighbor> {
        let reach = (radius / AVERAGE_STOP_DISTANCE).as_meters().ceil().abs() as i32;
        let (origin_x, origin_y) = origin.to_cell();
        let mut results: Vec<Neighbor> = (-reach..=reach)
            .into_par_iter()
            .flat_map(|x| {
                (-reach..=reach)
                    .flat_map(move |y| {
                        let cell = (origin_x + x, origin_y + y);
                        self.buckets
                            .get(&cell)
                            .into_iter()
                            .flat_map(|idxs| idxs.iter())
                            .filter_map(|idx| {
                                let entity = &entities[*idx as usize];
                                let distance = entity.coordinate().network_distance(origin);
                                (distance <= radius).then_some(Neighbor {
                                    index: *idx,
                                    distance,
                                })
                            })
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        results.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
        results
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mobility::{MobilityMode, MobilityVehicle};

    fn vehicle(index: u32, lat: f32, lon: f32) -> MobilityVehicle {
        MobilityVehicle {
            index,
            id: format!("v{index}").into(),
            mode: MobilityMode::Bike,
            coordinate: Coordinate::new(lat, lon),
            capacity: 5,
        }
    }

    #[test]
    fn within_radius_finds_nearby_and_excludes_far() {
        let vehicles = vec![
            vehicle(0, 37.4979, 127.0276),
            vehicle(1, 37.4980, 127.0277),
            vehicle(2, 38.5, 128.5),
        ];
        let index = SpatialIndex::build(&vehicles);
        let found = index.within_radius(&vehicles, &Coordinate::new(37.4979, 127.0276), Distance::from_meters(500.0));
        let indices: Vec<u32> = found.iter().map(|n| n.index).collect();
        assert!(indices.contains(&0));
        assert!(indices.contains(&1));
        assert!(!indices.contains(&2));
    }
}
