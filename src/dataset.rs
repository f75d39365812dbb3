//! Loads a routing [`Dataset`]: a [`Repository`] plus the road-distance
//! oracle the planner queries it through. Ties together the GTFS-shaped feed
//! loader ([`crate::gtfs`]), the micro-mobility sidecar, and the district's
//! bounding box/zone grid resolution.

use std::{fs::File, io, path::Path};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    gtfs::Gtfs,
    mobility::{MobilityVehicleRecord, TariffTable},
    oracle::{self, SharedOracle},
    repository::{self, Repository},
    zone::BoundingBox,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("gtfs error: {0}")]
    Gtfs(#[from] crate::gtfs::Error),
    #[error("manifest io error: {0}")]
    Io(#[from] io::Error),
    #[error("manifest json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("repository error: {0}")]
    Repository(#[from] repository::Error),
}

/// District-level metadata with no natural home in a GTFS feed: the bounding
/// box the zone grid tiles, its resolution, and where to find the
/// micro-mobility sidecar. Read from `manifest.json` at the dataset root.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    bounding_box: BoundingBox,
    #[serde(default = "default_grid_size")]
    grid_size: u32,
    #[serde(default = "default_mobility_file")]
    mobility_file: String,
}

fn default_grid_size() -> u32 {
    30
}

fn default_mobility_file() -> String {
    "mobility.json".into()
}

/// The routing dataset a [`crate::planner::Planner`] is built over: a loaded
/// [`Repository`] plus the road-distance oracle queries are resolved through.
pub struct Dataset {
    pub repository: Repository,
    pub oracle: SharedOracle,
    pub tariff: TariffTable,
}

impl Dataset {
    /// Loads a district directory: `manifest.json` for the bounding box/grid
    /// size, a GTFS-shaped feed as loose CSVs, and a `mobility.json` sidecar
    /// (a JSON array of [`MobilityVehicleRecord`]).
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, Error> {
        let dir = dir.as_ref();
        info!("Loading dataset from {:?}", dir);
        let manifest = read_manifest(dir)?;

        let data = Gtfs::new().from_directory(dir).load_all()?;
        let mobility_vehicles = read_mobility(dir, &manifest.mobility_file)?;

        Self::assemble(data, mobility_vehicles, manifest)
    }

    /// Loads a district whose GTFS tables are zipped; `manifest.json` and the
    /// mobility sidecar are read from `manifest_dir` alongside the zip.
    pub fn load_zip<P: AsRef<Path>>(zip_path: P, manifest_dir: P) -> Result<Self, Error> {
        let manifest_dir = manifest_dir.as_ref();
        let manifest = read_manifest(manifest_dir)?;

        let data = Gtfs::new().from_zip(zip_path)?.load_all()?;
        let mobility_vehicles = read_mobility(manifest_dir, &manifest.mobility_file)?;

        Self::assemble(data, mobility_vehicles, manifest)
    }

    fn assemble(
        data: crate::gtfs::GtfsData,
        mobility_vehicles: Vec<MobilityVehicleRecord>,
        manifest: Manifest,
    ) -> Result<Self, Error> {
        let repository = Repository::new().load_gtfs(
            data,
            mobility_vehicles,
            manifest.bounding_box,
            manifest.grid_size,
        )?;

        Ok(Self {
            repository,
            oracle: oracle::default_oracle(),
            tariff: TariffTable::default(),
        })
    }

    /// Swaps in a custom road-distance oracle (e.g. a real OSM-backed one)
    /// instead of the haversine x 1.3 default.
    pub fn with_oracle(mut self, oracle: SharedOracle) -> Self {
        self.oracle = oracle;
        self
    }

    /// Overrides the default tariff table (e.g. a dataset with different
    /// mobility pricing or transit fares than the defaults in [`TariffTable`]).
    pub fn with_tariff(mut self, tariff: TariffTable) -> Self {
        self.tariff = tariff;
        self
    }
}

fn read_manifest(dir: &Path) -> Result<Manifest, Error> {
    let file = File::open(dir.join("manifest.json"))?;
    Ok(serde_json::from_reader(file)?)
}

fn read_mobility(dir: &Path, file_name: &str) -> Result<Vec<MobilityVehicleRecord>, Error> {
    let path = dir.join(file_name);
    if !path.exists() {
        debug!("No mobility sidecar at {:?}, skipping", path);
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}
