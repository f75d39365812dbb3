/// File names the feed loader expects inside a zip archive or directory.
///
/// Every path has a sane default matching the standard GTFS-like table names;
/// override individual fields when a feed uses nonstandard file names.
pub struct Config {
    pub stops_path: String,
    pub routes_path: String,
    pub trips_path: String,
    pub stop_times_path: String,
    pub transfers_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stops_path: "stops.txt".into(),
            routes_path: "routes.txt".into(),
            trips_path: "trips.txt".into(),
            stop_times_path: "stop_times.txt".into(),
            transfers_path: "transfers.txt".into(),
        }
    }
}
