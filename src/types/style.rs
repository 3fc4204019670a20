use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: f32,
    pub opacity: f32,
}

impl LineStyle {
    pub const COMPLETED: LineStyle = LineStyle {
        color: "#2ecc71",
        weight: 5.0,
        opacity: 0.9,
    };

    pub const REMAINING: LineStyle = LineStyle {
        color: "#e94560",
        weight: 4.0,
        opacity: 0.7,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Start,
    Stop,
    Finish,
    Boat,
}

impl MarkerKind {
    pub fn fill(&self) -> &'static str {
        match self {
            MarkerKind::Start => "#2ecc71",
            MarkerKind::Stop => "#ffffff",
            MarkerKind::Finish => "#e94560",
            MarkerKind::Boat => "#111111",
        }
    }

    pub fn radius(&self) -> f64 {
        match self {
            MarkerKind::Boat => 11.0,
            _ => 7.0,
        }
    }
}

/// Colour for the progress fill: blends from the remaining colour to the
/// completed colour as the fraction approaches 1.
pub fn progress_fill_color(fraction: f64) -> String {
    let t = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    let start = parse_hex_color(LineStyle::REMAINING.color).unwrap_or((255, 255, 255));
    let end = parse_hex_color(LineStyle::COMPLETED.color).unwrap_or((255, 255, 255));
    let r = lerp_u8(start.0, end.0, t);
    let g = lerp_u8(start.1, end.1, t);
    let b = lerp_u8(start.2, end.2, t);
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let value = hex.trim_start_matches('#');
    if value.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&value[0..2], 16).ok()?;
    let g = u8::from_str_radix(&value[2..4], 16).ok()?;
    let b = u8::from_str_radix(&value[4..6], 16).ok()?;
    Some((r, g, b))
}

fn lerp_u8(start: u8, end: u8, t: f64) -> u8 {
    let value = start as f64 + (end as f64 - start as f64) * t;
    value.round().clamp(0.0, 255.0) as u8
}
