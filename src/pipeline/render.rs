use std::fmt::Write;

use crate::error::RenderError;
use crate::pipeline::progress::ProgressReport;
use crate::types::route::{Point, Route};
use crate::types::style::{progress_fill_color, LineStyle, MarkerKind};
use crate::types::viz::RenderOptions;

const MAX_MERCATOR_LAT: f64 = 85.0;
const PROGRESS_BAR_HEIGHT: f64 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextSlot {
    TotalKm,
    KmToNext,
    CurrentSegment,
    KmRemaining,
    ProgressPercent,
    DataSource,
}

impl TextSlot {
    fn position(&self) -> usize {
        match self {
            TextSlot::TotalKm => 0,
            TextSlot::KmToNext => 1,
            TextSlot::CurrentSegment => 2,
            TextSlot::KmRemaining => 3,
            TextSlot::ProgressPercent => 4,
            TextSlot::DataSource => 5,
        }
    }
}

/// Drawing surface for a progress snapshot. One implementation per target.
pub trait MapRenderer {
    fn draw_polyline(&mut self, points: &[Point], style: &LineStyle);
    fn draw_marker(&mut self, at: Point, kind: MarkerKind, label: Option<&str>);
    fn set_text(&mut self, slot: TextSlot, text: &str);
    /// Fill fraction of the progress bar, in `[0, 1]`.
    fn set_progress(&mut self, fraction: f64);
}

/// Pushes one snapshot through a renderer. Lines with fewer than two
/// points are skipped.
pub fn render_progress<R: MapRenderer + ?Sized>(
    renderer: &mut R,
    route: &Route,
    report: &ProgressReport,
    source_label: &str,
) {
    if report.lines.remaining.len() >= 2 {
        renderer.draw_polyline(&report.lines.remaining, &LineStyle::REMAINING);
    }
    if report.lines.completed.len() >= 2 {
        renderer.draw_polyline(&report.lines.completed, &LineStyle::COMPLETED);
    }

    let stops = route.stops();
    for (idx, stop) in stops.iter().enumerate() {
        let kind = if idx == 0 {
            MarkerKind::Start
        } else if idx == stops.len() - 1 {
            MarkerKind::Finish
        } else {
            MarkerKind::Stop
        };
        renderer.draw_marker(stop.point(), kind, Some(&stop.name));
    }

    if let Some(position) = report.position {
        renderer.draw_marker(position, MarkerKind::Boat, None);
    }

    renderer.set_text(TextSlot::TotalKm, &format!("{:.1}", report.total_km));
    renderer.set_text(TextSlot::KmToNext, &format!("{:.1}", report.km_to_next()));
    renderer.set_text(TextSlot::CurrentSegment, &report.segment_label());
    renderer.set_text(TextSlot::KmRemaining, &format!("{:.1}", report.km_remaining));
    renderer.set_text(TextSlot::ProgressPercent, &format!("{:.1}%", report.percent));
    renderer.set_text(TextSlot::DataSource, &format!("Datakälla: {}", source_label));
    renderer.set_progress(report.percent / 100.0);
}

/// Projects lat/lon into the map area below the stats header.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    fn fit(points: &[Point], options: &RenderOptions) -> Result<Self, RenderError> {
        let padding = options.padding as f64;
        let view_width = options.width as f64 - 2.0 * padding;
        let view_height = options.height as f64 - 2.0 * padding - options.header_height as f64;
        if view_width <= 0.0 || view_height <= 0.0 {
            return Err(RenderError::SvgError("Invalid viewport size".to_string()));
        }

        let projected: Vec<(f64, f64)> = points
            .iter()
            .map(|p| mercator_project(p.lat, p.lon))
            .collect();

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (x, y) in &projected {
            min_x = min_x.min(*x);
            max_x = max_x.max(*x);
            min_y = min_y.min(*y);
            max_y = max_y.max(*y);
        }
        if projected.is_empty() {
            (min_x, max_x, min_y, max_y) = (0.0, 0.0, 0.0, 0.0);
        }

        let content_width = (max_x - min_x).max(f64::EPSILON);
        let content_height = (max_y - min_y).max(f64::EPSILON);
        let scale = if projected.len() < 2 {
            1.0
        } else {
            (view_width / content_width).min(view_height / content_height)
        };
        let offset_x = padding + (view_width - (max_x - min_x) * scale) * 0.5;
        let offset_y = options.header_height as f64
            + padding
            + (view_height - (max_y - min_y) * scale) * 0.5;

        Ok(Self {
            min_x,
            max_y,
            scale,
            offset_x,
            offset_y,
        })
    }

    fn project(&self, point: Point) -> (f64, f64) {
        let (x, y) = mercator_project(point.lat, point.lon);
        (
            self.offset_x + (x - self.min_x) * self.scale,
            self.offset_y + (self.max_y - y) * self.scale,
        )
    }
}

fn mercator_project(lat: f64, lon: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let x = lon;
    let y = (lat.to_radians().tan() + (1.0 / lat.to_radians().cos())).ln().to_degrees();
    (x, y)
}

/// Renders a snapshot into a standalone SVG document.
pub struct SvgRenderer {
    options: RenderOptions,
    viewport: Viewport,
    lines: String,
    markers: String,
    texts: [Option<String>; 6],
    progress: f64,
}

impl SvgRenderer {
    pub fn new(options: RenderOptions, route: &Route) -> Result<Self, RenderError> {
        let points: Vec<Point> = route.stops().iter().map(|s| s.point()).collect();
        let viewport = Viewport::fit(&points, &options)?;
        Ok(Self {
            options,
            viewport,
            lines: String::new(),
            markers: String::new(),
            texts: Default::default(),
            progress: 0.0,
        })
    }

    pub fn finish(self) -> String {
        let width = self.options.width;
        let height = self.options.height;
        let padding = self.options.padding as f64;
        let text = |slot: TextSlot| {
            self.texts[slot.position()]
                .as_deref()
                .map(escape_xml)
                .unwrap_or_default()
        };

        let bar_width = width as f64 - 2.0 * padding;
        let bar_y = padding + 82.0;
        let fill_width = bar_width * self.progress;

        let mut header = String::new();
        let _ = write!(
            header,
            r##"<text x="{:.1}" y="{:.1}" font-family="DejaVu Sans, sans-serif" font-size="30" font-weight="bold" fill="#111111">{}</text>"##,
            padding,
            padding + 10.0,
            text(TextSlot::CurrentSegment)
        );
        let _ = write!(
            header,
            r##"<text x="{:.1}" y="{:.1}" font-family="DejaVu Sans, sans-serif" font-size="20" fill="#333333">{} km rodda · {} km till nästa stopp · {} km kvar</text>"##,
            padding,
            padding + 50.0,
            text(TextSlot::TotalKm),
            text(TextSlot::KmToNext),
            text(TextSlot::KmRemaining)
        );
        let _ = write!(
            header,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="7" fill="#dddddd"/>"##,
            padding, bar_y, bar_width, PROGRESS_BAR_HEIGHT
        );
        if fill_width > 0.0 {
            let _ = write!(
                header,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" rx="7" fill="{}"/>"#,
                padding,
                bar_y,
                fill_width,
                PROGRESS_BAR_HEIGHT,
                progress_fill_color(self.progress)
            );
        }
        let _ = write!(
            header,
            r##"<text x="{:.1}" y="{:.1}" font-family="DejaVu Sans, sans-serif" font-size="18" fill="#333333" text-anchor="end">{}</text>"##,
            width as f64 - padding,
            bar_y + 38.0,
            text(TextSlot::ProgressPercent)
        );

        let footer = format!(
            r##"<text x="{:.1}" y="{:.1}" font-family="DejaVu Sans, sans-serif" font-size="14" fill="#666666" text-anchor="end">{}</text>"##,
            width as f64 - padding,
            height as f64 - padding * 0.4,
            text(TextSlot::DataSource)
        );

        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
  <g id="header">{}</g>
  <g id="lines">{}</g>
  <g id="markers">{}</g>
  {}
</svg>"#,
            width, height, width, height, header, self.lines, self.markers, footer
        )
    }
}

impl MapRenderer for SvgRenderer {
    fn draw_polyline(&mut self, points: &[Point], style: &LineStyle) {
        if points.len() < 2 {
            return;
        }
        let coords: Vec<String> = points
            .iter()
            .map(|p| {
                let (x, y) = self.viewport.project(*p);
                format!("{:.2},{:.2}", x, y)
            })
            .collect();
        let _ = write!(
            self.lines,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{:.1}" stroke-opacity="{:.2}" stroke-linecap="round" stroke-linejoin="round"/>"#,
            coords.join(" "),
            style.color,
            style.weight,
            style.opacity
        );
    }

    fn draw_marker(&mut self, at: Point, kind: MarkerKind, label: Option<&str>) {
        let (x, y) = self.viewport.project(at);
        let radius = kind.radius();
        let _ = write!(
            self.markers,
            r##"<circle cx="{:.2}" cy="{:.2}" r="{:.1}" fill="{}" stroke="#111111" stroke-width="2"/>"##,
            x,
            y,
            radius,
            kind.fill()
        );
        if let Some(label) = label.filter(|_| self.options.show_stop_labels) {
            let _ = write!(
                self.markers,
                r##"<text x="{:.2}" y="{:.2}" font-family="DejaVu Sans, sans-serif" font-size="14" fill="#222222">{}</text>"##,
                x + radius + 4.0,
                y + 5.0,
                escape_xml(label)
            );
        }
    }

    fn set_text(&mut self, slot: TextSlot, text: &str) {
        self.texts[slot.position()] = Some(text.to_string());
    }

    fn set_progress(&mut self, fraction: f64) {
        self.progress = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
}

pub fn render_svg(
    route: &Route,
    report: &ProgressReport,
    source_label: &str,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let mut renderer = SvgRenderer::new(options.clone(), route)?;
    render_progress(&mut renderer, route, report, source_label);
    Ok(renderer.finish())
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
