use serde::Serialize;

use crate::pipeline::aggregate;
use crate::pipeline::partition::{partition, RoutePartition};
use crate::pipeline::resolve::{interpolate, resolve, sanitize_km};
use crate::types::route::{Point, Route};
use crate::types::session::Session;

/// Label shown when there is no current segment.
pub const ARRIVED_LABEL: &str = "Framme!";

#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub index: usize,
    pub from: String,
    pub to: String,
    pub progress: f64,
    pub km_to_next: f64,
}

impl SegmentSummary {
    pub fn label(&self) -> String {
        format!("{} → {}", self.from, self.to)
    }
}

/// Everything the presentation layer needs for one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub total_km: f64,
    pub route_km: f64,
    pub route_length_is_fallback: bool,
    pub km_remaining: f64,
    pub percent: f64,
    pub arrived: bool,
    pub segment: Option<SegmentSummary>,
    pub position: Option<Point>,
    #[serde(flatten)]
    pub lines: RoutePartition,
}

impl ProgressReport {
    pub fn build(route: &Route, sessions: &[Session]) -> Self {
        Self::for_distance(route, aggregate::total_km(sessions))
    }

    pub fn for_distance(route: &Route, total_km: f64) -> Self {
        let total_km = sanitize_km(total_km);
        let length = route.total_length();
        let route_km = length.km();
        if length.is_fallback() {
            tracing::debug!("Route length unavailable, using fallback of {} km", route_km);
        }

        let segment = resolve(total_km, route);
        let position = segment.map(|s| interpolate(s.from, s.to, s.progress));
        let segment = segment.map(|s| SegmentSummary {
            index: s.index,
            from: s.from.name.clone(),
            to: s.to.name.clone(),
            progress: s.progress,
            km_to_next: (s.to.cum_km - total_km).max(0.0),
        });

        Self {
            total_km,
            route_km,
            route_length_is_fallback: length.is_fallback(),
            km_remaining: (route_km - total_km).max(0.0),
            percent: (total_km * 100.0 / route_km).min(100.0),
            arrived: !length.is_fallback() && total_km >= route_km,
            segment,
            position,
            lines: partition(total_km, route),
        }
    }

    pub fn segment_label(&self) -> String {
        self.segment
            .as_ref()
            .map(SegmentSummary::label)
            .unwrap_or_else(|| ARRIVED_LABEL.to_string())
    }

    pub fn km_to_next(&self) -> f64 {
        self.segment.as_ref().map(|s| s.km_to_next).unwrap_or(0.0)
    }
}
