use std::sync::OnceLock;

use usvg::fontdb::Database;

use crate::error::RasterError;
use crate::types::viz::OutputConfig;

/// Font files tried before the system fonts. Stop names use Swedish letters,
/// so a DejaVu face is preferred over whatever the system picks first.
const MAP_FONT_FILES: &[&str] = &[
    "./assets/fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

static MAP_FONTS: OnceLock<Database> = OnceLock::new();

fn map_fonts() -> &'static Database {
    MAP_FONTS.get_or_init(|| {
        let mut fonts = Database::new();
        let loaded = MAP_FONT_FILES
            .iter()
            .filter(|path| fonts.load_font_file(path).is_ok())
            .count();
        fonts.load_system_fonts();
        tracing::debug!(
            "Map font database ready: {} bundled files, {} faces",
            loaded,
            fonts.len()
        );
        fonts
    })
}

/// Turns a rendered map SVG into a PNG of the requested size.
///
/// The map is scaled uniformly and centred, so a request with a different
/// aspect ratio than the SVG gets margins instead of a stretched route.
pub fn png_from_svg(svg: &str, output: &OutputConfig) -> Result<Vec<u8>, RasterError> {
    let tree = usvg::Tree::from_str(svg, &usvg::Options::default(), map_fonts())
        .map_err(|e| RasterError::RenderFailed(format!("Failed to parse map SVG: {}", e)))?;

    let mut pixmap = tiny_skia::Pixmap::new(output.width, output.height).ok_or_else(|| {
        RasterError::RenderFailed(format!(
            "Cannot allocate a {}x{} map image",
            output.width, output.height
        ))
    })?;
    if let Some((r, g, b, a)) = output.background {
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    let size = tree.size();
    let scale = (output.width as f32 / size.width()).min(output.height as f32 / size.height());
    let dx = (output.width as f32 - size.width() * scale) / 2.0;
    let dy = (output.height as f32 - size.height() * scale) / 2.0;
    let transform = tiny_skia::Transform::from_scale(scale, scale).post_translate(dx, dy);

    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| RasterError::RenderFailed(format!("Failed to encode map PNG: {}", e)))
}
