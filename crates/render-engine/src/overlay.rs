//! Selection overlay drawn over the video preview while the user drags.

use clipdeck_processing_core::region_select::Redraw;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

pub const MASK_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
pub const BORDER_COLOR: Rgba<u8> = Rgba([59, 130, 246, 255]);
pub const BORDER_PX: u32 = 2;

/// Rasterize a [`Redraw`] request: dimmed surface, clear selection, highlighted border.
pub fn render_selection_overlay(redraw: &Redraw) -> RgbaImage {
    let width = redraw.display.width.round().max(1.0) as u32;
    let height = redraw.display.height.round().max(1.0) as u32;
    let mut overlay = RgbaImage::from_pixel(width, height, MASK_COLOR);

    let Some(rect) = redraw.rect else {
        return overlay;
    };

    let x0 = rect.x.round().clamp(0.0, width as f64) as u32;
    let y0 = rect.y.round().clamp(0.0, height as f64) as u32;
    let x1 = rect.right().round().clamp(0.0, width as f64) as u32;
    let y1 = rect.bottom().round().clamp(0.0, height as f64) as u32;
    if x1 <= x0 || y1 <= y0 {
        return overlay;
    }

    for y in y0..y1 {
        for x in x0..x1 {
            overlay.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }

    for inset in 0..BORDER_PX {
        let w = (x1 - x0).saturating_sub(2 * inset);
        let h = (y1 - y0).saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let border = Rect::at((x0 + inset) as i32, (y0 + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(&mut overlay, border, BORDER_COLOR);
    }

    overlay
}
