//! Zone Grid (C3): maps a coordinate onto an integer cell within the
//! district's bounding box, and derives the multimodal routing strategy from
//! the Chebyshev distance between an origin/destination zone pair.
//!
//! Pure and stateless: every function here is a closed-form computation over
//! a [`BoundingBox`] and a grid size, with no dependency on the loaded dataset.

use serde::{Deserialize, Serialize};

use crate::shared::geo::Coordinate;

/// The district's extent, supplied by the routing dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct BoundingBox {
    pub lat_min: f32,
    pub lat_max: f32,
    pub lon_min: f32,
    pub lon_max: f32,
}

impl BoundingBox {
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.lat_min..=self.lat_max).contains(&coordinate.latitude)
            && (self.lon_min..=self.lon_max).contains(&coordinate.longitude)
    }
}

/// An integer `(row, col)` cell on the uniform zone grid.
pub type ZoneId = (u32, u32);

/// Multimodal weighting selected by zone distance; see [`strategy_for`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strategy {
    pub name: &'static str,
    pub mobility_weight: f32,
    pub transit_weight: f32,
}

impl Strategy {
    pub fn is_mobility_only(&self) -> bool {
        self.name == "mobility_only"
    }
}

const STRATEGY_TABLE: &[Strategy] = &[
    Strategy {
        name: "mobility_only",
        mobility_weight: 1.0,
        transit_weight: 0.0,
    },
    Strategy {
        name: "mobility_first",
        mobility_weight: 0.8,
        transit_weight: 0.2,
    },
    Strategy {
        name: "mobility_preferred",
        mobility_weight: 0.7,
        transit_weight: 0.3,
    },
    Strategy {
        name: "balanced",
        mobility_weight: 0.5,
        transit_weight: 0.5,
    },
    Strategy {
        name: "transit_preferred",
        mobility_weight: 0.3,
        transit_weight: 0.7,
    },
    Strategy {
        name: "transit_first",
        mobility_weight: 0.2,
        transit_weight: 0.8,
    },
    Strategy {
        name: "transit_only",
        mobility_weight: 0.1,
        transit_weight: 0.9,
    },
];

/// Returns the weighted strategy for a given Chebyshev zone distance. Distances
/// at or beyond the table's last entry all collapse to `transit_only`.
pub fn strategy_for(zone_distance: u32) -> Strategy {
    let idx = (zone_distance as usize).min(STRATEGY_TABLE.len() - 1);
    STRATEGY_TABLE[idx]
}

/// A uniform `grid_size x grid_size` tiling of a district's bounding box.
#[derive(Debug, Clone, Copy)]
pub struct ZoneGrid {
    bounding_box: BoundingBox,
    grid_size: u32,
}

impl Default for ZoneGrid {
    fn default() -> Self {
        Self::new(BoundingBox::default(), 1)
    }
}

impl ZoneGrid {
    pub fn new(bounding_box: BoundingBox, grid_size: u32) -> Self {
        Self {
            bounding_box,
            grid_size,
        }
    }

    pub fn zone_of(&self, coordinate: &Coordinate) -> ZoneId {
        let lat_span = (self.bounding_box.lat_max - self.bounding_box.lat_min).max(f32::EPSILON);
        let lon_span = (self.bounding_box.lon_max - self.bounding_box.lon_min).max(f32::EPSILON);
        let i = (((coordinate.latitude - self.bounding_box.lat_min) / lat_span)
            * self.grid_size as f32) as i64;
        let j = (((coordinate.longitude - self.bounding_box.lon_min) / lon_span)
            * self.grid_size as f32) as i64;
        let max = (self.grid_size - 1) as i64;
        (i.clamp(0, max) as u32, j.clamp(0, max) as u32)
    }

    pub fn zone_distance(&self, a: ZoneId, b: ZoneId) -> u32 {
        let di = a.0.abs_diff(b.0);
        let dj = a.1.abs_diff(b.1);
        di.max(dj)
    }

    /// All zones within Chebyshev `radius` of `center`, including `center` itself.
    pub fn neighbors(&self, center: ZoneId, radius: u32) -> Vec<ZoneId> {
        let max = self.grid_size - 1;
        let i_lo = center.0.saturating_sub(radius);
        let i_hi = (center.0 + radius).min(max);
        let j_lo = center.1.saturating_sub(radius);
        let j_hi = (center.1 + radius).min(max);
        let mut zones = Vec::with_capacity(((i_hi - i_lo + 1) * (j_hi - j_lo + 1)) as usize);
        for i in i_lo..=i_hi {
            for j in j_lo..=j_hi {
                zones.push((i, j));
            }
        }
        zones
    }
}

#[test]
fn zone_of_center_cell_round_trip() {
    let bbox = BoundingBox {
        lat_min: 37.40,
        lat_max: 37.60,
        lon_min: 126.90,
        lon_max: 127.10,
    };
    let grid = ZoneGrid::new(bbox, 30);
    for i in 0..30u32 {
        for j in 0..30u32 {
            let lat = bbox.lat_min + (i as f32 + 0.5) * (bbox.lat_max - bbox.lat_min) / 30.0;
            let lon = bbox.lon_min + (j as f32 + 0.5) * (bbox.lon_max - bbox.lon_min) / 30.0;
            assert_eq!(grid.zone_of(&Coordinate::new(lat, lon)), (i, j));
        }
    }
}

#[test]
fn zone_distance_is_chebyshev() {
    let bbox = BoundingBox {
        lat_min: 0.0,
        lat_max: 1.0,
        lon_min: 0.0,
        lon_max: 1.0,
    };
    let grid = ZoneGrid::new(bbox, 10);
    assert_eq!(grid.zone_distance((2, 2), (5, 3)), 3);
    assert_eq!(grid.zone_distance((2, 2), (2, 2)), 0);
}

#[test]
fn strategy_table_bounds() {
    assert_eq!(strategy_for(0).name, "mobility_only");
    assert_eq!(strategy_for(6).name, "transit_only");
    assert_eq!(strategy_for(100).name, "transit_only");
}
