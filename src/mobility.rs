//! Micro-mobility entities: docked bikes and virtual stations aggregating
//! free-floating scooters/e-bikes. These never appear in the transit feed;
//! they are loaded from a small sidecar JSON file (see [`crate::gtfs`]).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::shared::{
    geo::{Coordinate, Distance},
    time::Duration,
};

/// The vehicle family backing a [`MobilityVehicle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobilityMode {
    Bike,
    Kickboard,
    Ebike,
}

impl MobilityMode {
    /// Cruising speed in meters/second, used to convert a ride distance into a duration.
    pub const fn speed_mps(&self) -> f32 {
        match self {
            MobilityMode::Bike => 4.17,
            MobilityMode::Kickboard | MobilityMode::Ebike => 5.56,
        }
    }

    pub const fn tariff(&self) -> Tariff {
        match self {
            MobilityMode::Bike => Tariff {
                unlock_fee: 1000,
                per_minute: 0,
            },
            MobilityMode::Kickboard => Tariff {
                unlock_fee: 1200,
                per_minute: 150,
            },
            MobilityMode::Ebike => Tariff {
                unlock_fee: 1500,
                per_minute: 180,
            },
        }
    }
}

/// Flat unlock fee plus a per-minute rate, both in opaque currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tariff {
    pub unlock_fee: u32,
    pub per_minute: u32,
}

impl Tariff {
    pub fn cost(&self, ride: Duration) -> u32 {
        let minutes = ride.as_seconds().div_ceil(60);
        self.unlock_fee + self.per_minute * minutes
    }
}

/// A docked bike station or virtual cell aggregating free-floating vehicles.
#[derive(Debug, Clone)]
pub struct MobilityVehicle {
    pub index: u32,
    pub id: Arc<str>,
    pub mode: MobilityMode,
    pub coordinate: Coordinate,
    /// Nominal number of vehicles available; this crate does not model real-time
    /// availability, so it is informational only.
    pub capacity: u32,
}

impl MobilityVehicle {
    pub fn ride_duration(&self, meters: Distance) -> Duration {
        Duration::from_seconds((meters.as_meters() / self.mode.speed_mps()).ceil() as u32)
    }
}

/// Dataset-level tariff table. Defaults mirror [`MobilityMode::tariff`], but a
/// dataset may override any entry instead of baking the numbers in as constants.
#[derive(Debug, Clone, Copy)]
pub struct TariffTable {
    pub bike: Tariff,
    pub kickboard: Tariff,
    pub ebike: Tariff,
    /// Flat fare for a journey that only uses one transit route.
    pub transit_flat: u32,
    /// Extra cost per kilometer once a journey mixes transit with a second mode.
    pub hybrid_surcharge_per_km: u32,
}

impl Default for TariffTable {
    fn default() -> Self {
        Self {
            bike: MobilityMode::Bike.tariff(),
            kickboard: MobilityMode::Kickboard.tariff(),
            ebike: MobilityMode::Ebike.tariff(),
            transit_flat: 1370,
            hybrid_surcharge_per_km: 100,
        }
    }
}

impl TariffTable {
    pub fn mobility(&self, mode: MobilityMode) -> Tariff {
        match mode {
            MobilityMode::Bike => self.bike,
            MobilityMode::Kickboard => self.kickboard,
            MobilityMode::Ebike => self.ebike,
        }
    }
}

/// On-disk sidecar row, one per docked station / virtual cell.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MobilityVehicleRecord {
    pub id: String,
    pub mode: MobilityMode,
    pub lat: f32,
    pub lon: f32,
    pub capacity: u32,
}

impl MobilityVehicleRecord {
    pub(crate) fn into_vehicle(self, index: u32) -> MobilityVehicle {
        MobilityVehicle {
            index,
            id: self.id.into(),
            mode: self.mode,
            coordinate: Coordinate::new(self.lat, self.lon),
            capacity: self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tariff_table_default_matches_mode_constants() {
        let table = TariffTable::default();
        assert_eq!(table.mobility(MobilityMode::Bike), MobilityMode::Bike.tariff());
        assert_eq!(table.mobility(MobilityMode::Kickboard), MobilityMode::Kickboard.tariff());
        assert_eq!(table.mobility(MobilityMode::Ebike), MobilityMode::Ebike.tariff());
    }

    #[test]
    fn kickboard_tariff_rounds_up_to_next_minute() {
        let tariff = MobilityMode::Kickboard.tariff();
        assert_eq!(tariff.cost(Duration::from_seconds(61)), 1200 + 150 * 2);
    }
}
