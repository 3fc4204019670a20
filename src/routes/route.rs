use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;
use crate::types::route::Stop;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/route", get(route))
}

#[derive(Serialize)]
struct StopView {
    #[serde(flatten)]
    stop: Stop,
    is_start: bool,
    is_end: bool,
}

#[derive(Serialize)]
struct RouteResponse {
    stops: Vec<StopView>,
    total_km: f64,
    total_is_fallback: bool,
}

async fn route(State(state): State<AppState>) -> Json<RouteResponse> {
    let snapshot = state.snapshot().await;
    let route = &snapshot.dataset.route;
    let length = route.total_length();
    let last = route.stops().len().saturating_sub(1);

    let stops = route
        .stops()
        .iter()
        .enumerate()
        .map(|(idx, stop)| StopView {
            stop: stop.clone(),
            is_start: idx == 0,
            is_end: idx == last,
        })
        .collect();

    Json(RouteResponse {
        stops,
        total_km: length.km(),
        total_is_fallback: length.is_fallback(),
    })
}
