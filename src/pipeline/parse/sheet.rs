use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::ParseError;
use crate::pipeline::parse::SessionParser;
use crate::types::session::Session;

const DATE_HEADERS: [&str; 2] = ["date", "datum"];
const METERS_HEADERS: [&str; 2] = ["meters", "meter"];
const NOTE_HEADERS: [&str; 3] = ["note", "not", "anteckning"];

/// Published spreadsheet export: a header row followed by one session per line.
pub struct SheetCsvParser;

impl SessionParser for SheetCsvParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<Session>, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidCsv(e.to_string()))?;
        let text = text.trim();
        if text.lines().count() < 2 {
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ParseError::InvalidCsv(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let date_idx = find_column(&headers, &DATE_HEADERS).ok_or(ParseError::MissingColumn("date"))?;
        let meters_idx =
            find_column(&headers, &METERS_HEADERS).ok_or(ParseError::MissingColumn("meters"))?;
        let note_idx = find_column(&headers, &NOTE_HEADERS);
        let required = date_idx.max(meters_idx);

        let mut sessions = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ParseError::InvalidCsv(e.to_string()))?;
            if record.len() <= required {
                continue;
            }
            if let Some(session) = session_from_record(&record, date_idx, meters_idx, note_idx) {
                sessions.push(session);
            }
        }

        Ok(sessions)
    }
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.contains(&h.as_str()))
}

fn session_from_record(
    record: &StringRecord,
    date_idx: usize,
    meters_idx: usize,
    note_idx: Option<usize>,
) -> Option<Session> {
    let date = record.get(date_idx)?.trim();
    let meters = parse_leading_int(record.get(meters_idx)?);
    if date.is_empty() || meters <= 0 {
        return None;
    }
    let note = note_idx
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Some(Session {
        date: date.to_string(),
        meters: meters as f64,
        note,
    })
}

/// Reads the integer prefix of a cell: `"5000.7"` is 5000, `"12 km"` is 12,
/// text without leading digits is 0.
fn parse_leading_int(raw: &str) -> i64 {
    let raw = raw.trim();
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
