use serde::Deserialize;

use crate::error::ParseError;
use crate::pipeline::parse::SessionParser;
use crate::types::route::{Route, Stop};
use crate::types::session::Session;

/// Session rows stored as a JSON array.
pub struct JsonRowsParser;

impl SessionParser for JsonRowsParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Session>, ParseError> {
        serde_json::from_slice(bytes).map_err(|e| ParseError::InvalidJson(e.to_string()))
    }
}

#[derive(Deserialize)]
struct RouteFile {
    #[serde(default)]
    stops: Vec<Stop>,
}

/// Parses `{"stops": [...]}` and validates the stop order.
pub fn parse_route(bytes: &[u8]) -> Result<Route, ParseError> {
    let file: RouteFile =
        serde_json::from_slice(bytes).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    Ok(Route::new(file.stops)?)
}
