use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::pipeline::progress::ProgressReport;
use crate::pipeline::{rasterize, render};
use crate::state::{AppState, RenderKey};
use crate::types::viz::{OutputConfig, OutputFormat, RenderOptions};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/map.svg", get(map_svg))
        .route("/api/map.png", get(map_png))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MapQuery {
    width: Option<u32>,
    height: Option<u32>,
    background: Option<String>,
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), AppError> {
    const MIN_DIM: u32 = 320;
    const MAX_DIM: u32 = 4096;
    const MAX_MEGAPIXELS: f64 = 10.0;

    if !(MIN_DIM..=MAX_DIM).contains(&width) || !(MIN_DIM..=MAX_DIM).contains(&height) {
        return Err(AppError::BadRequest(format!(
            "Invalid dimensions: {}x{}. Width/height must be between {} and {}",
            width, height, MIN_DIM, MAX_DIM
        )));
    }

    let megapixels = (width as f64 * height as f64) / 1_000_000.0;
    if megapixels > MAX_MEGAPIXELS {
        return Err(AppError::BadRequest(format!(
            "Image too large: {}x{} ({:.2} MP). Max allowed is {:.1} MP",
            width, height, megapixels, MAX_MEGAPIXELS
        )));
    }

    Ok(())
}

fn render_options(query: &MapQuery) -> Result<RenderOptions, AppError> {
    let mut options = RenderOptions::default();
    match (query.width, query.height) {
        (Some(width), Some(height)) => {
            validate_dimensions(width, height)?;
            options.width = width;
            options.height = height;
        }
        (None, None) => {}
        _ => {
            return Err(AppError::BadRequest(
                "Both width and height must be provided together".to_string(),
            ))
        }
    }
    Ok(options)
}

fn parse_background(background: Option<&str>) -> Result<Option<(u8, u8, u8, u8)>, AppError> {
    match background {
        Some("white") => Ok(Some((255, 255, 255, 255))),
        Some("black") => Ok(Some((0, 0, 0, 255))),
        Some("transparent") | None => Ok(None),
        Some(other) => Err(AppError::BadRequest(format!(
            "Invalid background: {}. Use 'transparent', 'white', or 'black'",
            other
        ))),
    }
}

async fn map_svg(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<impl IntoResponse, AppError> {
    if query.background.is_some() {
        return Err(AppError::BadRequest(
            "background only applies to PNG output".to_string(),
        ));
    }
    render_map(state, query, OutputFormat::Svg).await
}

async fn map_png(
    State(state): State<AppState>,
    Query(query): Query<MapQuery>,
) -> Result<impl IntoResponse, AppError> {
    render_map(state, query, OutputFormat::Png).await
}

async fn render_map(
    state: AppState,
    query: MapQuery,
    format: OutputFormat,
) -> Result<impl IntoResponse, AppError> {
    let options = render_options(&query)?;
    let background = parse_background(query.background.as_deref())?;
    let snapshot = state.snapshot().await;

    let key = RenderKey {
        generation: snapshot.generation,
        format,
        width: options.width,
        height: options.height,
        background: query.background.clone(),
    };

    let bytes = match state.cached_render(&key) {
        Some(bytes) => {
            tracing::debug!("Serving cached {} map ({}x{})", format.as_str(), options.width, options.height);
            bytes
        }
        None => {
            let dataset = &snapshot.dataset;
            let report = ProgressReport::build(&dataset.route, &dataset.sessions);
            let svg = render::render_svg(&dataset.route, &report, &dataset.source_label, &options)?;
            let bytes = match format {
                OutputFormat::Svg => svg.into_bytes(),
                OutputFormat::Png => {
                    let output = OutputConfig {
                        width: options.width,
                        height: options.height,
                        background,
                    };
                    rasterize::png_from_svg(&svg, &output)?
                }
            };
            tracing::info!(
                "Rendered {} map {}x{} at {:.1} km: {} bytes",
                format.as_str(),
                options.width,
                options.height,
                report.total_km,
                bytes.len()
            );
            state.store_render(key, bytes.clone());
            bytes
        }
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, format.content_type())],
        bytes,
    ))
}
