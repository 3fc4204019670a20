mod json;
mod sheet;

pub use json::{parse_route, JsonRowsParser};
pub use sheet::SheetCsvParser;

use crate::error::ParseError;
use crate::types::session::Session;

pub trait SessionParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Session>, ParseError>;
}
