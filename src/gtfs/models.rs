use crate::{
    repository::{LocationType, Route, RouteMode, Stop, StopAccessType, StopTime, Timepoint},
    shared::{
        geo::{Coordinate, Distance},
        time::Time,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsStop {
    pub stop_id: String,
    pub stop_name: String,
    pub stop_lat: f32,
    pub stop_lon: f32,
    pub location_type: Option<u8>,
    pub parent_station: Option<String>,
    pub platform_code: Option<String>,
}

impl From<GtfsStop> for Stop {
    fn from(value: GtfsStop) -> Self {
        let location_type = if let Some(lt) = value.location_type
            && lt != 0
        {
            match lt {
                1 => LocationType::Station,
                2 => LocationType::Entrance(value.parent_station.unwrap_or("0".into()).into()),
                3 => LocationType::Node,
                4 => LocationType::Boarding,
                _ => panic!("SHOULD NEVER BE MORE THEN 4"),
            }
        } else if let Some(ps) = value.parent_station {
            let pc = value.platform_code.unwrap_or("/".into());
            LocationType::Platform {
                parent_station: ps.into(),
                platform_code: pc.into(),
            }
        } else {
            LocationType::Stop
        };

        Self {
            index: u32::MAX,
            id: value.stop_id.into(),
            name: value.stop_name.into(),
            coordinate: Coordinate {
                latitude: value.stop_lat,
                longitude: value.stop_lon,
            },
            location_type,
            parent_index: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsRoute {
    pub route_id: String,
    pub agency_id: Option<String>,
    pub route_short_name: Option<String>,
    pub route_long_name: Option<String>,
    pub route_type: i32,
    pub route_desc: Option<String>,
}

impl From<GtfsRoute> for Route {
    fn from(value: GtfsRoute) -> Self {
        Self {
            index: u32::MAX,
            id: value.route_id.into(),
            short_name: value.route_short_name.map(|val| val.into()),
            long_name: value.route_long_name.map(|val| val.into()),
            mode: RouteMode::from(value.route_type),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsTransfer {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub transfer_type: String,
    pub min_transfer_time: Option<u32>,
    pub from_trip_id: Option<String>,
    pub to_trip_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsStopTime {
    pub trip_id: String,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_id: String,
    pub stop_sequence: u16,
    pub stop_headsign: Option<String>,
    pub pickup_type: u8,
    pub drop_off_type: u8,
    pub shape_dist_traveled: Option<f32>,
    pub timepoint: Option<u8>,
}

impl From<GtfsStopTime> for StopTime {
    fn from(value: GtfsStopTime) -> Self {
        Self {
            index: u32::MAX,
            trip_idx: u32::MAX,
            stop_idx: u32::MAX,
            slice: Default::default(),
            internal_idx: u32::MAX,
            sequence: value.stop_sequence,
            arrival_time: Time::from_hms(&value.arrival_time).unwrap(),
            departure_time: Time::from_hms(&value.departure_time).unwrap(),
            headsign: value.stop_headsign.map(|val| val.into()),
            dist_traveled: value.shape_dist_traveled.map(Distance::from_meters),
            pickup_type: StopAccessType::Regularly,
            drop_off_type: StopAccessType::Regularly,
            timepoint: Timepoint::Exact,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GtfsTrip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    pub trip_headsign: Option<String>,
    pub trip_short_name: Option<String>,
    pub direction_id: Option<u8>,
}
