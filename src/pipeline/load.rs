use std::path::Path;

use crate::config::Config;
use crate::error::LoadError;
use crate::pipeline::parse::{parse_route, JsonRowsParser, SessionParser, SheetCsvParser};
use crate::types::route::Route;
use crate::types::session::Session;

pub const ROUTE_LOAD_FAILED: &str = "Kunde inte ladda rutten";
pub const SESSIONS_LOAD_FAILED: &str = "Kunde inte ladda rodddata";

const SOURCE_SHEET: &str = "Google Sheets";
const SOURCE_LOCAL_FILE: &str = "lokal fil";

/// One immutable snapshot of everything loaded from the outside world.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub route: Route,
    pub sessions: Vec<Session>,
    pub source_label: String,
    /// User-facing messages for anything that failed to load.
    pub messages: Vec<String>,
}

pub async fn load_dataset(config: &Config, client: &reqwest::Client) -> Dataset {
    let mut messages = Vec::new();

    let route = match load_route(&config.route_path).await {
        Ok(route) => {
            tracing::info!(
                "Loaded route with {} stops ({} km)",
                route.stops().len(),
                route.total_length().km()
            );
            route
        }
        Err(err) => {
            tracing::error!("Failed to load route: {}", err);
            messages.push(ROUTE_LOAD_FAILED.to_string());
            Route::empty()
        }
    };

    if !route.is_resolvable() {
        tracing::warn!(
            "Route has {} stops, position is unknown and length falls back to {} km",
            route.stops().len(),
            route.total_length().km()
        );
    }

    let mut sessions = Vec::new();
    let mut source_label = String::new();

    if let Some(url) = config.sheet_url.as_deref() {
        match fetch_sheet(client, url).await {
            Ok(rows) if !rows.is_empty() => {
                sessions = rows;
                source_label = SOURCE_SHEET.to_string();
            }
            Ok(_) => tracing::warn!("Sheet returned no sessions, trying local fallback"),
            Err(err) => tracing::warn!("Sheet fetch failed, trying local fallback: {}", err),
        }
    }

    if sessions.is_empty() {
        match read_sessions(&config.sessions_path).await {
            Ok(rows) => {
                sessions = rows;
                source_label = SOURCE_LOCAL_FILE.to_string();
            }
            Err(err) => {
                tracing::error!("Failed to load rowing data: {}", err);
                messages.push(SESSIONS_LOAD_FAILED.to_string());
            }
        }
    }

    let local_entries = read_local_entries(&config.local_entries_path).await;
    if !local_entries.is_empty() {
        source_label = if source_label.is_empty() {
            format!("{} lokala", local_entries.len())
        } else {
            format!("{} + {} lokala", source_label, local_entries.len())
        };
        sessions.extend(local_entries);
    }

    tracing::info!(
        "Loaded {} sessions from {}",
        sessions.len(),
        if source_label.is_empty() { "nowhere" } else { source_label.as_str() }
    );

    Dataset {
        route,
        sessions,
        source_label,
        messages,
    }
}

pub async fn load_route(path: &Path) -> Result<Route, LoadError> {
    let bytes = read_file(path).await?;
    Ok(parse_route(&bytes)?)
}

pub async fn fetch_sheet(client: &reqwest::Client, url: &str) -> Result<Vec<Session>, LoadError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(LoadError::Status(response.status().as_u16()));
    }
    let body = response.bytes().await?;
    Ok(SheetCsvParser.parse(&body)?)
}

pub async fn read_sessions(path: &Path) -> Result<Vec<Session>, LoadError> {
    let bytes = read_file(path).await?;
    Ok(JsonRowsParser.parse(&bytes)?)
}

/// Extra entries recorded on this device. Missing or unreadable files count as none.
pub async fn read_local_entries(path: &Path) -> Vec<Session> {
    match read_sessions(path).await {
        Ok(entries) => entries,
        Err(LoadError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Vec::new()
        }
        Err(err) => {
            tracing::warn!("Ignoring local entries: {}", err);
            Vec::new()
        }
    }
}

/// Appends to the local entries file. A corrupt file is reported, never overwritten.
pub async fn append_local_entry(path: &Path, entry: Session) -> Result<usize, LoadError> {
    let mut entries = match read_sessions(path).await {
        Ok(entries) => entries,
        Err(LoadError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            Vec::new()
        }
        Err(err) => return Err(err),
    };
    entries.push(entry);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| io_error(path, source))?;
    }
    let json = serde_json::to_vec_pretty(&entries)
        .map_err(|e| crate::error::ParseError::InvalidJson(e.to_string()))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| io_error(path, source))?;
    Ok(entries.len())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path).await.map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.display().to_string(),
        source,
    }
}
