//! Animated quote card.
//!
//! Every frame is a pure function of `t`: gradient background, a drifting
//! particle field, then the title and author text fading in. Nothing about
//! the previous frame is kept, so frames can be rendered in any order.

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::geometry::PixelSize;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::compositor::{FrameCompositor, FrameOutcome};
use crate::surface::{diagonal_gradient, with_blend};
use crate::text::{wrap_text, GlyphPainter};
use crate::theme::Theme;

pub const TITLE_PX: f32 = 56.0;
pub const AUTHOR_PX: f32 = 32.0;
pub const PARTICLE_COUNT: usize = 40;
/// Fraction of the canvas width available to one line of title text.
pub const LINE_WIDTH_RATIO: f32 = 0.8;
/// How far the author label travels upward while fading in.
pub const AUTHOR_SLIDE_PX: f32 = 20.0;
const TITLE_AUTHOR_GAP_PX: f32 = 24.0;

/// Title opacity: ramps 0 → 1 over the first half.
pub fn title_opacity(t: f64) -> f32 {
    (t / 0.5).clamp(0.0, 1.0) as f32
}

/// Author opacity: ramps 0 → 1 over the second half.
pub fn author_opacity(t: f64) -> f32 {
    ((t - 0.5) / 0.5).clamp(0.0, 1.0) as f32
}

/// Remaining downward offset of the author label.
pub fn author_offset(t: f64) -> f32 {
    AUTHOR_SLIDE_PX * (1.0 - author_opacity(t))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub opacity: f32,
}

fn hash_unit(index: u32, salt: u32) -> f32 {
    let mut h = index.wrapping_mul(0x9E37_79B9) ^ salt.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^= h >> 16;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

/// Particle positions at time `t`. Particles rise and wrap around the top edge.
pub fn particle_field(t: f64, width: u32, height: u32) -> Vec<Particle> {
    let w = width as f32;
    let h = height as f32;
    let t = t.clamp(0.0, 1.0) as f32;
    (0..PARTICLE_COUNT as u32)
        .map(|i| {
            let base_x = hash_unit(i, 1) * w;
            let base_y = hash_unit(i, 2) * h;
            let rise = (0.2 + 0.4 * hash_unit(i, 3)) * h;
            let sway = (hash_unit(i, 4) - 0.5) * 0.05 * w;
            Particle {
                x: base_x + sway * (t * std::f32::consts::TAU).sin(),
                y: (base_y - rise * t).rem_euclid(h.max(1.0)),
                radius: 2.0 + 3.0 * hash_unit(i, 5),
                opacity: 0.15 + 0.3 * hash_unit(i, 6),
            }
        })
        .collect()
}

/// Content and canvas of one quote animation.
#[derive(Debug, Clone)]
pub struct QuoteScene {
    pub title: String,
    pub author: String,
    pub theme: Theme,
    pub width: u32,
    pub height: u32,
    pub duration_ms: u64,
}

impl QuoteScene {
    pub fn validate(&self) -> ClipdeckResult<()> {
        if self.title.trim().is_empty() {
            return Err(ClipdeckError::invalid_input("Quote title is empty"));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ClipdeckError::invalid_input(format!(
                "Canvas {}x{} has zero area",
                self.width, self.height
            )));
        }
        if self.duration_ms == 0 {
            return Err(ClipdeckError::invalid_input("Animation duration is zero"));
        }
        Ok(())
    }
}

/// Renders a [`QuoteScene`] through a [`GlyphPainter`].
pub struct QuoteCompositor<P> {
    scene: QuoteScene,
    painter: P,
    background: RgbaImage,
    title_lines: Vec<String>,
}

impl<P: GlyphPainter> QuoteCompositor<P> {
    pub fn new(scene: QuoteScene, painter: P) -> ClipdeckResult<Self> {
        scene.validate()?;
        let max_width = scene.width as f32 * LINE_WIDTH_RATIO;
        let title_lines = wrap_text(&painter, &scene.title, TITLE_PX, max_width);
        let background =
            diagonal_gradient(scene.width, scene.height, scene.theme.start, scene.theme.end);

        tracing::debug!(
            theme = scene.theme.name,
            lines = title_lines.len(),
            width = scene.width,
            height = scene.height,
            "Quote layout ready"
        );

        Ok(Self {
            scene,
            painter,
            background,
            title_lines,
        })
    }

    pub fn scene(&self) -> &QuoteScene {
        &self.scene
    }

    pub fn title_lines(&self) -> &[String] {
        &self.title_lines
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    fn draw_particles(&self, t: f64, surface: &mut RgbaImage) {
        let [r, g, b] = self.scene.theme.accent;
        let particles = particle_field(t, self.scene.width, self.scene.height);
        with_blend(surface, |canvas| {
            for p in &particles {
                let alpha = (p.opacity * 255.0).round() as u8;
                draw_filled_circle_mut(
                    canvas,
                    (p.x.round() as i32, p.y.round() as i32),
                    p.radius.round() as i32,
                    Rgba([r, g, b, alpha]),
                );
            }
        });
    }

    fn draw_text(&self, t: f64, surface: &mut RgbaImage) {
        let width = self.scene.width as f32;
        let title_lh = self.painter.line_height(TITLE_PX);
        let author = self.scene.author.trim();
        let author_block = if author.is_empty() {
            0.0
        } else {
            TITLE_AUTHOR_GAP_PX + self.painter.line_height(AUTHOR_PX)
        };
        let block = title_lh * self.title_lines.len() as f32 + author_block;
        let mut y = (self.scene.height as f32 - block) / 2.0;

        let title_alpha = title_opacity(t);
        for line in &self.title_lines {
            if title_alpha > 0.0 {
                let x = (width - self.painter.text_width(line, TITLE_PX)) / 2.0;
                self.painter.draw_text(
                    surface,
                    line,
                    x,
                    y,
                    TITLE_PX,
                    self.scene.theme.text,
                    title_alpha,
                );
            }
            y += title_lh;
        }

        let author_alpha = author_opacity(t);
        if !author.is_empty() && author_alpha > 0.0 {
            let x = (width - self.painter.text_width(author, AUTHOR_PX)) / 2.0;
            self.painter.draw_text(
                surface,
                author,
                x,
                y + TITLE_AUTHOR_GAP_PX + author_offset(t),
                AUTHOR_PX,
                self.scene.theme.accent,
                author_alpha,
            );
        }
    }
}

impl<P: GlyphPainter> FrameCompositor for QuoteCompositor<P> {
    fn surface_size(&self) -> PixelSize {
        PixelSize::new(self.scene.width, self.scene.height)
    }

    fn render_frame(&mut self, t: f64, surface: &mut RgbaImage) -> ClipdeckResult<FrameOutcome> {
        if surface.dimensions() != self.background.dimensions() {
            return Err(ClipdeckError::render(format!(
                "Surface is {}x{}, expected {}x{}",
                surface.width(),
                surface.height(),
                self.scene.width,
                self.scene.height
            )));
        }
        surface.copy_from_slice(self.background.as_raw());
        self.draw_particles(t, surface);
        self.draw_text(t, surface);
        Ok(FrameOutcome::Rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tests::FixedPainter;
    use crate::theme::theme_by_name;

    fn scene(title: &str, author: &str) -> QuoteScene {
        QuoteScene {
            title: title.to_string(),
            author: author.to_string(),
            theme: theme_by_name("sunset").unwrap(),
            width: 320,
            height: 180,
            duration_ms: 5000,
        }
    }

    #[test]
    fn test_opacity_ramps() {
        assert_eq!(title_opacity(0.0), 0.0);
        assert_eq!(title_opacity(0.25), 0.5);
        assert_eq!(title_opacity(0.5), 1.0);
        assert_eq!(title_opacity(1.0), 1.0);

        assert_eq!(author_opacity(0.25), 0.0);
        assert_eq!(author_opacity(0.5), 0.0);
        assert_eq!(author_opacity(0.75), 0.5);
        assert_eq!(author_opacity(1.0), 1.0);

        assert_eq!(author_offset(0.5), AUTHOR_SLIDE_PX);
        assert_eq!(author_offset(1.0), 0.0);
    }

    #[test]
    fn test_particles_depend_only_on_t() {
        let a = particle_field(0.3, 320, 180);
        let b = particle_field(0.3, 320, 180);
        assert_eq!(a, b);
        assert_eq!(a.len(), PARTICLE_COUNT);
        assert_ne!(a, particle_field(0.6, 320, 180));
        for p in &a {
            assert!(p.y >= 0.0 && p.y < 180.0);
            assert!(p.opacity > 0.0 && p.opacity < 0.5);
        }
    }

    #[test]
    fn test_title_wrapped_to_line_budget() {
        // 56px font in FixedPainter is 28px per char; 256px budget holds 9 chars.
        let comp = QuoteCompositor::new(scene("stay hungry stay foolish", ""), FixedPainter::default())
            .unwrap();
        assert_eq!(comp.title_lines(), &["stay", "hungry", "stay", "foolish"]);
    }

    #[test]
    fn test_text_fades_in_order() {
        let mut comp =
            QuoteCompositor::new(scene("be", "ada"), FixedPainter::default()).unwrap();
        let mut surface = RgbaImage::new(320, 180);

        comp.render_frame(0.0, &mut surface).unwrap();
        assert!(comp.painter().calls.borrow().is_empty());

        comp.render_frame(0.25, &mut surface).unwrap();
        {
            let calls = comp.painter().calls.borrow();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].0, "be");
            assert_eq!(calls[0].4, 0.5);
        }
        comp.painter().calls.borrow_mut().clear();

        comp.render_frame(0.75, &mut surface).unwrap();
        let calls = comp.painter().calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "ada");
        assert_eq!(calls[1].3, AUTHOR_PX);
        assert_eq!(calls[1].4, 0.5);
    }

    #[test]
    fn test_author_slides_up() {
        let mut comp =
            QuoteCompositor::new(scene("be", "ada"), FixedPainter::default()).unwrap();
        let mut surface = RgbaImage::new(320, 180);
        comp.render_frame(0.6, &mut surface).unwrap();
        comp.render_frame(1.0, &mut surface).unwrap();
        let calls = comp.painter().calls.borrow();
        let ys: Vec<f32> = calls.iter().filter(|c| c.0 == "ada").map(|c| c.2).collect();
        assert_eq!(ys.len(), 2);
        assert!(ys[0] > ys[1]);
        assert!((ys[0] - ys[1] - AUTHOR_SLIDE_PX * 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_same_t_same_pixels() {
        let mut comp =
            QuoteCompositor::new(scene("be", "ada"), FixedPainter::default()).unwrap();
        let mut a = RgbaImage::new(320, 180);
        let mut b = RgbaImage::new(320, 180);
        comp.render_frame(0.4, &mut a).unwrap();
        comp.render_frame(0.9, &mut b).unwrap();
        comp.render_frame(0.4, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = QuoteCompositor::new(scene("  ", "x"), FixedPainter::default())
            .err()
            .unwrap();
        assert!(matches!(err, ClipdeckError::InvalidInput { .. }));
    }
}
