use chrono::{DateTime, Datelike, NaiveDate};
use serde::Serialize;

use crate::types::session::Session;

const SWEDISH_MONTHS: [&str; 12] = [
    "jan.", "feb.", "mars", "apr.", "maj", "juni", "juli", "aug.", "sep.", "okt.", "nov.", "dec.",
];

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub date: String,
    pub date_formatted: String,
    pub km: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn total_km(sessions: &[Session]) -> f64 {
    let meters: f64 = sessions
        .iter()
        .map(|s| s.meters)
        .filter(|m| m.is_finite() && *m > 0.0)
        .sum();
    meters / 1000.0
}

/// Newest first, capped at `limit`. Sessions whose date cannot be read go last.
pub fn recent_sessions(sessions: &[Session], limit: usize) -> Vec<SessionSummary> {
    let mut dated: Vec<(Option<NaiveDate>, &Session)> = sessions
        .iter()
        .map(|s| (parse_session_date(&s.date), s))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    dated
        .into_iter()
        .take(limit)
        .map(|(date, session)| SessionSummary {
            date: session.date.clone(),
            date_formatted: date
                .map(format_date_sv)
                .unwrap_or_else(|| session.date.clone()),
            km: format!("{:.1}", session.km()),
            note: session.note.clone(),
        })
        .collect()
}

pub fn parse_session_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y/%m/%d").ok()
}

/// `2025-01-12` -> `12 jan. 2025`
pub fn format_date_sv(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        SWEDISH_MONTHS[date.month0() as usize],
        date.year()
    )
}
