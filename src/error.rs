use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Stop {index} has a non-finite coordinate or distance")]
    NonFinite { index: usize },
    #[error("Route starts at negative distance {0} km")]
    NegativeStart(f64),
    #[error("Stop {index} at {km} km does not come after {previous_km} km")]
    NonMonotonic {
        index: usize,
        previous_km: f64,
        km: f64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Invalid CSV format: missing {0} column")]
    MissingColumn(&'static str),
    #[error("Invalid route: {0}")]
    InvalidRoute(#[from] RouteError),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("SVG generation failed: {0}")]
    SvgError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("PNG rendering failed: {0}")]
    RenderFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Load(_) | AppError::Render(_) | AppError::Raster(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
