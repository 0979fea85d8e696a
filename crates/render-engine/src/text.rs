//! Text measurement, wrapping and drawing.

use std::path::Path;

use clipdeck_common::capability::find_system_font;
use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

use crate::surface::blend_pixel;

/// Anything that can measure and draw a single line of text.
pub trait GlyphPainter {
    /// Advance width of `text` at `px` pixels.
    fn text_width(&self, text: &str, px: f32) -> f32;

    /// Baseline-to-baseline distance at `px` pixels.
    fn line_height(&self, px: f32) -> f32 {
        px * 1.2
    }

    /// Draw `text` with its top edge at `y_top`.
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        x: f32,
        y_top: f32,
        px: f32,
        color: [u8; 3],
        opacity: f32,
    );
}

/// Greedy word wrap. A single word wider than `max_width` gets a line of its own.
pub fn wrap_text<P: GlyphPainter + ?Sized>(
    painter: &P,
    text: &str,
    px: f32,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if painter.text_width(&candidate, px) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// TrueType painter backed by rusttype.
pub struct FontPainter {
    font: Font<'static>,
}

impl FontPainter {
    pub fn from_bytes(bytes: Vec<u8>) -> ClipdeckResult<Self> {
        let font = Font::try_from_vec(bytes)
            .ok_or_else(|| ClipdeckError::invalid_input("Font file could not be parsed"))?;
        Ok(Self { font })
    }

    pub fn load(path: &Path) -> ClipdeckResult<Self> {
        if !path.exists() {
            return Err(ClipdeckError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(path = %path.display(), "Loading font");
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Load the first well-known system font.
    pub fn from_system() -> ClipdeckResult<Self> {
        let path = find_system_font().ok_or_else(|| {
            ClipdeckError::capability("No usable font found; pass one with --font")
        })?;
        Self::load(&path)
    }
}

impl GlyphPainter for FontPainter {
    fn text_width(&self, text: &str, px: f32) -> f32 {
        let scale = Scale::uniform(px);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn line_height(&self, px: f32) -> f32 {
        let v = self.font.v_metrics(Scale::uniform(px));
        v.ascent - v.descent + v.line_gap
    }

    fn draw_text(
        &self,
        surface: &mut RgbaImage,
        text: &str,
        x: f32,
        y_top: f32,
        px: f32,
        color: [u8; 3],
        opacity: f32,
    ) {
        if opacity <= 0.0 {
            return;
        }
        let scale = Scale::uniform(px);
        let ascent = self.font.v_metrics(scale).ascent;
        let ink = Rgba([color[0], color[1], color[2], 255]);

        for glyph in self.font.layout(text, scale, point(x, y_top + ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                blend_pixel(
                    surface,
                    bb.min.x + gx as i32,
                    bb.min.y + gy as i32,
                    ink,
                    coverage * opacity,
                );
            });
        }
    }
}
