use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// Length reported when no usable route is loaded. Never a real measurement.
pub const FALLBACK_ROUTE_KM: f64 = 330.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub cum_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl Stop {
    pub fn point(&self) -> Point {
        Point {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

/// Consecutive stops bracketing a distance, plus the fraction travelled between them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Segment<'a> {
    pub index: usize,
    pub from: &'a Stop,
    pub to: &'a Stop,
    pub progress: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "km", rename_all = "lowercase")]
pub enum RouteLength {
    Measured(f64),
    Fallback(f64),
}

impl RouteLength {
    pub fn km(&self) -> f64 {
        match self {
            RouteLength::Measured(km) | RouteLength::Fallback(km) => *km,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RouteLength::Fallback(_))
    }
}

/// Ordered, validated stop sequence. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Route {
    stops: Vec<Stop>,
}

impl Route {
    pub fn new(stops: Vec<Stop>) -> Result<Self, RouteError> {
        for (index, stop) in stops.iter().enumerate() {
            if !stop.lat.is_finite() || !stop.lon.is_finite() || !stop.cum_km.is_finite() {
                return Err(RouteError::NonFinite { index });
            }
        }
        if let Some(first) = stops.first() {
            if first.cum_km < 0.0 {
                return Err(RouteError::NegativeStart(first.cum_km));
            }
        }
        for (index, pair) in stops.windows(2).enumerate() {
            if pair[1].cum_km <= pair[0].cum_km {
                return Err(RouteError::NonMonotonic {
                    index: index + 1,
                    previous_km: pair[0].cum_km,
                    km: pair[1].cum_km,
                });
            }
        }
        Ok(Self { stops })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// True when there is at least one segment to resolve against.
    pub fn is_resolvable(&self) -> bool {
        self.stops.len() >= 2
    }

    pub fn total_length(&self) -> RouteLength {
        match self.stops.last() {
            Some(last) if last.cum_km > 0.0 => RouteLength::Measured(last.cum_km),
            _ => RouteLength::Fallback(FALLBACK_ROUTE_KM),
        }
    }
}
