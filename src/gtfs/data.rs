use crate::gtfs::{GtfsRoute, GtfsStop, GtfsStopTime, GtfsTransfer, GtfsTrip};

#[derive(Default, Debug)]
pub struct GtfsData {
    pub stops: Vec<GtfsStop>,
    pub routes: Vec<GtfsRoute>,
    pub trips: Vec<GtfsTrip>,
    pub transfers: Vec<GtfsTransfer>,
    pub stop_times: Vec<GtfsStopTime>,
}
