use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::routes::progress::ProgressResponse;
use crate::state::AppState;
use crate::types::session::Session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reload", post(reload))
        .route("/api/sessions", post(add_session))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NewSession {
    date: String,
    meters: f64,
    #[serde(default)]
    note: Option<String>,
}

impl NewSession {
    fn validate(self) -> Result<Session, AppError> {
        let date = self.date.trim();
        if date.is_empty() {
            return Err(AppError::BadRequest("date must not be empty".to_string()));
        }
        if !self.meters.is_finite() || self.meters <= 0.0 {
            return Err(AppError::BadRequest(format!(
                "meters must be a positive number, got {}",
                self.meters
            )));
        }
        Ok(Session {
            date: date.to_string(),
            meters: self.meters,
            note: self
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        })
    }
}

async fn reload(State(state): State<AppState>) -> Json<ProgressResponse> {
    let snapshot = state.reload().await;
    Json(ProgressResponse::from_dataset(
        &snapshot.dataset,
        state.config().recent_sessions,
    ))
}

async fn add_session(
    State(state): State<AppState>,
    payload: Result<Json<NewSession>, JsonRejection>,
) -> Result<Json<ProgressResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let session = payload.validate()?;
    let count = state.append_local_entry(session).await?;
    tracing::info!(
        "Stored local entry ({} total) in {}",
        count,
        state.config().local_entries_path.display()
    );

    let snapshot = state.reload().await;
    Ok(Json(ProgressResponse::from_dataset(
        &snapshot.dataset,
        state.config().recent_sessions,
    )))
}
