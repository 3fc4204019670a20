use crate::types::route::{Point, Route, Segment, Stop};

/// Negative, NaN and infinite distances all read as zero.
pub fn sanitize_km(total_km: f64) -> f64 {
    if total_km.is_finite() && total_km > 0.0 {
        total_km
    } else {
        0.0
    }
}

/// Finds the segment containing `total_km`.
///
/// Segments are left-closed and right-open, so a distance exactly on a stop
/// belongs to the segment starting there. Anything at or past the last stop
/// pins to the final segment with progress 1. Returns `None` for routes with
/// fewer than two stops, and for distances before a route that starts above
/// zero.
pub fn resolve(total_km: f64, route: &Route) -> Option<Segment<'_>> {
    let stops = route.stops();
    if stops.len() < 2 {
        return None;
    }
    let last = &stops[stops.len() - 1];
    let clamped = sanitize_km(total_km).min(last.cum_km);

    for (index, pair) in stops.windows(2).enumerate() {
        let (from, to) = (&pair[0], &pair[1]);
        if clamped >= from.cum_km && clamped < to.cum_km {
            return Some(Segment {
                index,
                from,
                to,
                progress: (clamped - from.cum_km) / (to.cum_km - from.cum_km),
            });
        }
    }

    if clamped >= last.cum_km {
        return Some(Segment {
            index: stops.len() - 2,
            from: &stops[stops.len() - 2],
            to: last,
            progress: 1.0,
        });
    }

    None
}

/// Flat linear blend between two stops. Progress is clamped to `[0, 1]` and
/// the endpoints come back exactly.
pub fn interpolate(from: &Stop, to: &Stop, progress: f64) -> Point {
    if progress.is_nan() || progress <= 0.0 {
        return from.point();
    }
    if progress >= 1.0 {
        return to.point();
    }
    Point {
        lat: from.lat + (to.lat - from.lat) * progress,
        lon: from.lon + (to.lon - from.lon) * progress,
    }
}

pub fn current_position(total_km: f64, route: &Route) -> Option<Point> {
    resolve(total_km, route).map(|segment| interpolate(segment.from, segment.to, segment.progress))
}
