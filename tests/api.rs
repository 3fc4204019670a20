use std::path::{Path, PathBuf};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use rowtrack_rs::{
    config::Config,
    pipeline::load::{load_dataset, Dataset, ROUTE_LOAD_FAILED, SESSIONS_LOAD_FAILED},
    routes,
    state::AppState,
    types::{
        route::{Route, Stop},
        session::Session,
    },
};
use serde_json::Value;
use tower::ServiceExt;

const ROUTE_JSON: &str = r#"{"stops": [
    {"name": "Birka", "lat": 59.0, "lon": 18.0, "cum_km": 0, "info": "Start"},
    {"name": "Sigtuna", "lat": 59.0, "lon": 19.0, "cum_km": 10},
    {"name": "Grisslehamn", "lat": 60.5, "lon": 19.0, "cum_km": 25},
    {"name": "Åbo", "lat": 60.5, "lon": 21.0, "cum_km": 50}
]}"#;

fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::route::router())
        .merge(routes::progress::router())
        .merge(routes::map::router())
        .merge(routes::sessions::router())
        .with_state(state)
}

fn stop(name: &str, lat: f64, lon: f64, cum_km: f64) -> Stop {
    Stop {
        name: name.to_string(),
        lat,
        lon,
        cum_km,
        info: None,
    }
}

fn session(date: &str, meters: f64) -> Session {
    Session {
        date: date.to_string(),
        meters,
        note: None,
    }
}

fn sample_dataset() -> Dataset {
    Dataset {
        route: Route::new(vec![
            stop("Birka", 59.0, 18.0, 0.0),
            stop("Sigtuna", 59.0, 19.0, 10.0),
            stop("Grisslehamn", 60.5, 19.0, 25.0),
            stop("Åbo", 60.5, 21.0, 50.0),
        ])
        .expect("valid route"),
        sessions: vec![session("2025-01-02", 9000.0), session("2025-01-05", 6000.0)],
        source_label: "lokal fil".to_string(),
        messages: Vec::new(),
    }
}

/// Fresh directory per test so parallel tests never share files.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rowtrack-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("scratch dir");
    dir
}

fn file_config(dir: &Path) -> Config {
    Config {
        route_path: dir.join("route.json"),
        sessions_path: dir.join("rows.json"),
        local_entries_path: dir.join("local_rows.json"),
        ..Config::default()
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes")
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

#[tokio::test]
async fn progress_reports_position_lines_and_sessions() {
    let state = AppState::new(Config::default(), sample_dataset());
    let response = app(state).oneshot(get("/api/progress")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total_km"], 15.0);
    assert_eq!(json["route_km"], 50.0);
    assert_eq!(json["percent"], 30.0);
    assert_eq!(json["segment_label"], "Sigtuna → Grisslehamn");
    assert_eq!(json["segment"]["km_to_next"], 10.0);
    assert_eq!(json["completed"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["remaining"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["completed"][2], json["remaining"][0]);
    assert_eq!(json["sessions"][0]["date"], "2025-01-05");
    assert_eq!(json["sessions"][0]["km"], "6.0");
    assert_eq!(json["data_source"], "lokal fil");
}

#[tokio::test]
async fn route_lists_stops_with_start_and_end_flags() {
    let state = AppState::new(Config::default(), sample_dataset());
    let response = app(state).oneshot(get("/api/route")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let stops = json["stops"].as_array().expect("stops");
    assert_eq!(stops.len(), 4);
    assert_eq!(stops[0]["is_start"], true);
    assert_eq!(stops[0]["is_end"], false);
    assert_eq!(stops[3]["name"], "Åbo");
    assert_eq!(stops[3]["is_end"], true);
    assert_eq!(json["total_km"], 50.0);
    assert_eq!(json["total_is_fallback"], false);
}

#[tokio::test]
async fn map_svg_is_rendered_and_cached() {
    let app = app(AppState::new(Config::default(), sample_dataset()));

    let first = app.clone().oneshot(get("/api/map.svg")).await.expect("response");
    assert_eq!(first.status(), StatusCode::OK);
    let content_type = first
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    assert_eq!(content_type, "image/svg+xml");
    let first_body = body_bytes(first).await;
    let svg = String::from_utf8(first_body.clone()).expect("utf8");
    assert!(svg.contains("<polyline"));

    let second = app.oneshot(get("/api/map.svg")).await.expect("response");
    assert_eq!(body_bytes(second).await, first_body);
}

#[tokio::test]
async fn map_png_returns_image() {
    let app = app(AppState::new(Config::default(), sample_dataset()));
    let response = app
        .oneshot(get("/api/map.png?width=640&height=480&background=white"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert!(body.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[tokio::test]
async fn map_rejects_bad_parameters() {
    let app = app(AppState::new(Config::default(), sample_dataset()));
    for uri in [
        "/api/map.svg?width=640",
        "/api/map.png?width=100&height=100",
        "/api/map.png?width=4000&height=4000",
        "/api/map.png?background=purple",
        "/api/map.svg?background=white",
    ] {
        let response = app.clone().oneshot(get(uri)).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn dataset_merges_local_entries_after_fallback_rows() {
    let dir = scratch_dir("merge");
    std::fs::write(dir.join("route.json"), ROUTE_JSON).expect("route");
    std::fs::write(
        dir.join("rows.json"),
        r#"[{"date": "2025-01-01", "meters": 5000}, {"date": "2025-01-02", "meters": 5000}]"#,
    )
    .expect("rows");
    std::fs::write(
        dir.join("local_rows.json"),
        r#"[{"date": "2025-01-03", "meters": 2500, "note": "hemma"}]"#,
    )
    .expect("local");

    let dataset = load_dataset(&file_config(&dir), &reqwest::Client::new()).await;
    assert_eq!(dataset.route.stops().len(), 4);
    assert_eq!(dataset.sessions.len(), 3);
    assert_eq!(dataset.source_label, "lokal fil + 1 lokala");
    assert!(dataset.messages.is_empty());
}

#[tokio::test]
async fn missing_files_degrade_to_empty_dataset_with_messages() {
    let dir = scratch_dir("missing");
    let dataset = load_dataset(&file_config(&dir), &reqwest::Client::new()).await;
    assert!(dataset.route.is_empty());
    assert!(dataset.sessions.is_empty());
    assert_eq!(
        dataset.messages,
        vec![ROUTE_LOAD_FAILED.to_string(), SESSIONS_LOAD_FAILED.to_string()]
    );

    let state = AppState::new(file_config(&dir), dataset);
    let response = app(state).oneshot(get("/api/progress")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["route_length_is_fallback"], true);
    assert_eq!(json["segment"], Value::Null);
    assert_eq!(json["segment_label"], "Framme!");
}

#[tokio::test]
async fn posting_a_session_stores_it_locally_and_reloads() {
    let dir = scratch_dir("post");
    std::fs::write(dir.join("route.json"), ROUTE_JSON).expect("route");
    std::fs::write(dir.join("rows.json"), r#"[{"date": "2025-01-01", "meters": 10000}]"#)
        .expect("rows");

    let state = AppState::load(file_config(&dir)).await;
    let app = app(state);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/sessions",
            &serde_json::json!({"date": "2025-01-04", "meters": 5000, "note": "kväll"}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total_km"], 15.0);
    assert_eq!(json["data_source"], "lokal fil + 1 lokala");
    assert_eq!(json["sessions"][0]["note"], "kväll");

    let stored = std::fs::read_to_string(dir.join("local_rows.json")).expect("local file");
    let stored: Vec<Session> = serde_json::from_str(&stored).expect("stored json");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].meters, 5000.0);

    let rejected = app
        .oneshot(post_json(
            "/api/sessions",
            &serde_json::json!({"date": "2025-01-05", "meters": -10}),
        ))
        .await
        .expect("response");
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reload_picks_up_changed_rows() {
    let dir = scratch_dir("reload");
    std::fs::write(dir.join("route.json"), ROUTE_JSON).expect("route");
    std::fs::write(dir.join("rows.json"), r#"[{"date": "2025-01-01", "meters": 4000}]"#)
        .expect("rows");

    let state = AppState::load(file_config(&dir)).await;
    let app = app(state);

    let before = body_json(app.clone().oneshot(get("/api/progress")).await.expect("response")).await;
    assert_eq!(before["total_km"], 4.0);

    std::fs::write(
        dir.join("rows.json"),
        r#"[{"date": "2025-01-01", "meters": 4000}, {"date": "2025-01-02", "meters": 60000}]"#,
    )
    .expect("rows");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reload")
                .method("POST")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let after = body_json(response).await;
    assert_eq!(after["total_km"], 64.0);
    assert_eq!(after["percent"], 100.0);
    assert_eq!(after["arrived"], true);
    assert_eq!(after["remaining"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn malformed_session_body_is_a_json_bad_request() {
    let dir = scratch_dir("malformed");
    std::fs::write(dir.join("route.json"), ROUTE_JSON).expect("route");
    let app = app(AppState::load(file_config(&dir)).await);

    for body in [
        serde_json::json!({"date": "2025-01-04", "meters": "femtusen"}),
        serde_json::json!({"date": "2025-01-04", "meters": 5000, "boat": "Freja"}),
        serde_json::json!({"meters": 5000}),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/sessions", &body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let json = body_json(response).await;
        assert!(json["error"].is_string(), "{body}");
    }
    assert!(!dir.join("local_rows.json").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_reloads_keep_a_stored_session() {
    let dir = scratch_dir("overlap");
    std::fs::write(dir.join("route.json"), ROUTE_JSON).expect("route");
    std::fs::write(dir.join("rows.json"), r#"[{"date": "2025-01-01", "meters": 10000}]"#)
        .expect("rows");

    let state = AppState::load(file_config(&dir)).await;
    let reloads: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { state.reload().await.generation })
        })
        .collect();

    let response = app(state.clone())
        .oneshot(post_json(
            "/api/sessions",
            &serde_json::json!({"date": "2025-01-04", "meters": 5000}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let mut generations = Vec::new();
    for reload in reloads {
        generations.push(reload.await.expect("reload task"));
    }
    generations.sort_unstable();
    generations.dedup();
    assert_eq!(generations.len(), 8);

    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.generation, 9);
    assert_eq!(snapshot.dataset.sessions.len(), 2);
}
