use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::warn;
use transect::{
    Planner,
    planner::{Error as PlannerError, RoutePreference},
    shared::{geo::Coordinate, time::Time},
};

use crate::{dto::PlanResultDto, state::AppState};

pub async fn plan(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let Some(dataset) = &*state.dataset.read().await else {
        warn!("Missing dataset");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    };

    let origin = params
        .get("from")
        .ok_or(StatusCode::BAD_REQUEST)
        .and_then(|value| Coordinate::from_str(value).map_err(|_| StatusCode::BAD_REQUEST))?;
    let destination = params
        .get("to")
        .ok_or(StatusCode::BAD_REQUEST)
        .and_then(|value| Coordinate::from_str(value).map_err(|_| StatusCode::BAD_REQUEST))?;
    let departure_time = match params.get("departure") {
        Some(value) => Time::from_query_str(value).ok_or(StatusCode::BAD_REQUEST)?,
        None => Time::from_seconds(0),
    };
    let preference = match params.get("preference") {
        Some(value) => serde_json::from_str(value).map_err(|_| StatusCode::BAD_REQUEST)?,
        None => RoutePreference::default(),
    };
    let deadline = match params.get("deadline_ms") {
        Some(value) => {
            let millis: u64 = value.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
            Some(Instant::now() + Duration::from_millis(millis))
        }
        None => None,
    };

    let planner = Planner::new(dataset);
    let mut allocator = state.checkout_allocator(dataset);
    let result = planner.plan(&mut allocator, origin, destination, departure_time, &preference, deadline);
    state.return_allocator(allocator);

    match result {
        Ok(result) => Ok(Json(PlanResultDto::from(&result)).into_response()),
        Err(PlannerError::OutOfBounds) => Err(StatusCode::BAD_REQUEST),
        Err(PlannerError::NoPathFound) => Err(StatusCode::NOT_FOUND),
        Err(PlannerError::DatasetInvariantViolated(err)) => {
            warn!("Dataset invariant violated while planning: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
