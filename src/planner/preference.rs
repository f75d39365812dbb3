//! [`RoutePreference`]: the query-time weighting a caller supplies to steer
//! [`super::Planner::plan`]'s scoring pass. Deny-unknown-fields, matching the
//! GTFS row structs' deserialization posture.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{mobility::MobilityMode, shared::geo::Distance};

fn default_weight() -> f32 {
    1.0
}

fn default_max_walk_distance() -> Distance {
    Distance::from_meters(800.0)
}

fn default_max_walk_to_stop() -> Distance {
    Distance::from_meters(500.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutePreference {
    #[serde(default = "default_weight")]
    pub time_weight: f32,
    #[serde(default = "default_weight")]
    pub transfer_weight: f32,
    #[serde(default = "default_weight")]
    pub walk_weight: f32,
    #[serde(default = "default_weight")]
    pub cost_weight: f32,
    #[serde(default)]
    pub mobility_preference: HashMap<MobilityMode, f32>,
    #[serde(default = "default_max_walk_distance")]
    pub max_walk_distance: Distance,
    #[serde(default = "default_max_walk_to_stop")]
    pub max_walk_to_stop: Distance,
}

impl Default for RoutePreference {
    fn default() -> Self {
        Self {
            time_weight: default_weight(),
            transfer_weight: default_weight(),
            walk_weight: default_weight(),
            cost_weight: default_weight(),
            mobility_preference: HashMap::new(),
            max_walk_distance: default_max_walk_distance(),
            max_walk_to_stop: default_max_walk_to_stop(),
        }
    }
}

impl RoutePreference {
    /// The four ranking weights, divided by their sum so they act as a
    /// distribution rather than arbitrary magnitudes. Falls back to an equal
    /// split if a caller supplies all zeros.
    pub(crate) fn normalized_weights(&self) -> (f32, f32, f32, f32) {
        let sum = self.time_weight + self.transfer_weight + self.walk_weight + self.cost_weight;
        if sum <= f32::EPSILON {
            return (0.25, 0.25, 0.25, 0.25);
        }
        (
            self.time_weight / sum,
            self.transfer_weight / sum,
            self.walk_weight / sum,
            self.cost_weight / sum,
        )
    }

    pub(crate) fn mobility_weight(&self, mode: MobilityMode) -> f32 {
        self.mobility_preference.get(&mode).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_are_equal() {
        let preference = RoutePreference::default();
        let (tw, xw, ww, cw) = preference.normalized_weights();
        assert_eq!(tw, 0.25);
        assert_eq!(xw, 0.25);
        assert_eq!(ww, 0.25);
        assert_eq!(cw, 0.25);
    }

    #[test]
    fn zero_weights_fall_back_to_equal_split() {
        let preference = RoutePreference {
            time_weight: 0.0,
            transfer_weight: 0.0,
            walk_weight: 0.0,
            cost_weight: 0.0,
            ..RoutePreference::default()
        };
        let (tw, xw, ww, cw) = preference.normalized_weights();
        assert_eq!((tw, xw, ww, cw), (0.25, 0.25, 0.25, 0.25));
    }
}
