use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Color, Pixmap};

/// DejaVu Sans, bundled so text renders without any system fonts.
pub static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Loads `path` if given, otherwise the bundled font.
pub fn load_font(path: Option<&Path>) -> Result<FontArc> {
    match path {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
            FontArc::try_from_vec(bytes).map_err(|e| anyhow!("invalid font {}: {e}", path.display()))
        }
        None => FontArc::try_from_slice(BUNDLED_FONT).map_err(|e| anyhow!("bundled font: {e}")),
    }
}

/// Rasterises one line into a tightly cropped, transparent, premultiplied
/// pixmap. `None` when nothing in `text` has an outline (e.g. only spaces).
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Color,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);

    let mut caret = 0.0f32;
    let mut glyphs: Vec<Glyph> = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            caret += scaled.kern(prev.id, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, scaled.ascent())));
        caret += scaled.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for outline in &outlines {
        let b = outline.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let width = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let height = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pixmap = Pixmap::new(width, height)?;

    let rgba = color.to_color_u8();
    let stride = width as usize;
    let pixels = pixmap.pixels_mut();

    for outline in &outlines {
        let b = outline.px_bounds();
        let (dx, dy) = ((b.min.x - min_x) as i64, (b.min.y - min_y) as i64);
        outline.draw(|x, y, coverage| {
            let (px, py) = (i64::from(x) + dx, i64::from(y) + dy);
            if px < 0 || py < 0 || px >= i64::from(width) || py >= i64::from(height) {
                return;
            }
            let alpha = (f32::from(rgba.alpha()) * coverage.clamp(0.0, 1.0)).round() as u8;
            let i = py as usize * stride + px as usize;
            // overlapping glyph edges keep the denser coverage
            if alpha > pixels[i].alpha() {
                pixels[i] = tiny_skia::ColorU8::from_rgba(rgba.red(), rgba.green(), rgba.blue(), alpha)
                    .premultiply();
            }
        });
    }

    Some(pixmap)
}

/// Rendered text lines keyed by content.
pub struct TextCache {
    font: FontArc,
    size_px: f32,
    color: Color,
    map: HashMap<String, Option<Arc<Pixmap>>>,
}

impl TextCache {
    pub fn new(font: FontArc, size_px: f32, color: Color) -> Self {
        Self {
            font,
            size_px,
            color,
            map: HashMap::new(),
        }
    }

    pub fn get_or_render(&mut self, text: &str) -> Option<Arc<Pixmap>> {
        if let Some(hit) = self.map.get(text) {
            return hit.clone();
        }
        let rendered = render_text_pixmap(text, self.size_px, &self.font, self.color).map(Arc::new);
        self.map.insert(text.to_string(), rendered.clone());
        rendered
    }

    /// Distance between baselines of consecutive lines.
    pub fn line_height(&self) -> f32 {
        self.size_px * 1.4
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontArc {
        load_font(None).unwrap()
    }

    #[test]
    fn renders_visible_pixels_in_the_requested_color() {
        let pm = render_text_pixmap("Rest", 32.0, &font(), Color::BLACK).unwrap();
        assert!(pm.width() > pm.height());
        let opaque: Vec<_> = pm.pixels().iter().filter(|p| p.alpha() == 255).collect();
        assert!(!opaque.is_empty());
        assert!(opaque.iter().all(|p| p.red() == 0 && p.green() == 0 && p.blue() == 0));
    }

    #[test]
    fn whitespace_has_no_pixmap() {
        assert!(render_text_pixmap("   ", 24.0, &font(), Color::WHITE).is_none());
    }

    #[test]
    fn cache_renders_each_line_once() {
        let mut cache = TextCache::new(font(), 24.0, Color::BLACK);
        let a = cache.get_or_render("Trial 1 / 4").unwrap();
        let b = cache.get_or_render("Trial 1 / 4").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        cache.get_or_render("Trial 2 / 4");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(load_font(Some(Path::new("/nonexistent/font.ttf"))).is_err());
    }
}
