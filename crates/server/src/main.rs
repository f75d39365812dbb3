mod api;
mod dto;
mod state;

use crate::state::AppState;
use axum::routing::get;
use crossbeam_queue::SegQueue;
use std::{env, path::Path, process, sync::Arc, time::Instant};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use transect::Dataset;

const PORT: u32 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let start_logo = include_str!("../start_logo.txt");
    println!("{}", start_logo);

    let gtfs_data_path = match env::var("GTFS_DATA_PATH") {
        Ok(path_str) => Path::new(&path_str).to_owned(),
        Err(err) => {
            error!("Failed loading GTFS_DATA_PATH: {}", err);
            process::exit(1);
        }
    };
    let app_state = AppState {
        dataset: RwLock::new(None),
        gtfs_data_path,
        allocators: SegQueue::new(),
    };

    if app_state.gtfs_data_path.exists() {
        info!("Loading dataset...");
        let now = Instant::now();
        match Dataset::load_dir(&app_state.gtfs_data_path) {
            Ok(dataset) => {
                let _ = app_state.dataset.write().await.replace(dataset);
                info!("Loading dataset took {:?}", now.elapsed());
            }
            Err(err) => error!("Failed to load dataset: {err}"),
        }
    } else {
        warn!("No dataset found at GTFS_DATA_PATH.");
    }

    info!("Starting server...");

    let app = axum::Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/plan", get(api::plan))
        .with_state(Arc::new(app_state));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", PORT))
        .await
        .unwrap();
    info!("Listening to port {PORT}");
    axum::serve(listener, app).await.unwrap();
}
