use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::pipeline::aggregate::{self, SessionSummary};
use crate::pipeline::load::Dataset;
use crate::pipeline::progress::ProgressReport;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/progress", get(progress))
}

#[derive(Serialize)]
pub struct ProgressResponse {
    #[serde(flatten)]
    report: ProgressReport,
    segment_label: String,
    sessions: Vec<SessionSummary>,
    session_count: usize,
    data_source: String,
    messages: Vec<String>,
}

impl ProgressResponse {
    pub fn from_dataset(dataset: &Dataset, recent_limit: usize) -> Self {
        let report = ProgressReport::build(&dataset.route, &dataset.sessions);
        Self {
            segment_label: report.segment_label(),
            report,
            sessions: aggregate::recent_sessions(&dataset.sessions, recent_limit),
            session_count: dataset.sessions.len(),
            data_source: dataset.source_label.clone(),
            messages: dataset.messages.clone(),
        }
    }
}

async fn progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    let snapshot = state.snapshot().await;
    Json(ProgressResponse::from_dataset(
        &snapshot.dataset,
        state.config().recent_sessions,
    ))
}
