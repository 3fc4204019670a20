use serde::Serialize;

use crate::pipeline::resolve::{current_position, sanitize_km};
use crate::types::route::{Point, Route};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutePartition {
    pub completed: Vec<Point>,
    pub remaining: Vec<Point>,
}

/// Splits the route at the current position.
///
/// When a position is known it ends `completed` and starts `remaining`, so
/// the two lines meet at the boat. A position that coincides with the stop
/// next to it is not repeated, while every stop itself is kept. Without a
/// position the stops are split as they are, with nothing spliced in.
pub fn partition(total_km: f64, route: &Route) -> RoutePartition {
    let total_km = sanitize_km(total_km);
    let current = current_position(total_km, route);
    let mut completed = Vec::new();
    let mut remaining = Vec::new();

    for stop in route.stops() {
        if stop.cum_km <= total_km {
            completed.push(stop.point());
        } else {
            let point = stop.point();
            if remaining.is_empty() {
                if let Some(seam) = current.filter(|seam| *seam != point) {
                    remaining.push(seam);
                }
            }
            remaining.push(point);
        }
    }

    if let Some(point) = current {
        if completed.last().is_some_and(|last| *last != point) {
            completed.push(point);
        }
    }

    RoutePartition {
        completed,
        remaining,
    }
}
