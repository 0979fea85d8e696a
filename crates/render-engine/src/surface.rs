//! Pixel helpers shared by the compositors.

use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::Blend;

/// Alpha-blend `color` at `opacity` onto one pixel. Out-of-range coordinates are ignored.
pub fn blend_pixel(surface: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, opacity: f32) {
    if x < 0 || y < 0 || x >= surface.width() as i32 || y >= surface.height() as i32 {
        return;
    }
    let alpha = (color[3] as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
    if alpha == 0 {
        return;
    }
    let src = Rgba([color[0], color[1], color[2], alpha]);
    surface.get_pixel_mut(x as u32, y as u32).blend(&src);
}

/// Run imageproc drawing calls with alpha blending on `surface`.
pub fn with_blend<F>(surface: &mut RgbaImage, draw: F)
where
    F: FnOnce(&mut Blend<RgbaImage>),
{
    let mut canvas = Blend(std::mem::take(surface));
    draw(&mut canvas);
    *surface = canvas.0;
}

/// Linear interpolation between two RGB colors.
pub fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Opaque diagonal gradient from `start` (top-left) to `end` (bottom-right).
pub fn diagonal_gradient(width: u32, height: u32, start: [u8; 3], end: [u8; 3]) -> RgbaImage {
    let w = width as f32;
    let h = height as f32;
    let norm = (w * w + h * h).max(1.0);
    RgbaImage::from_fn(width, height, |x, y| {
        // Projection of the pixel onto the (0,0)->(w,h) axis.
        let t = (x as f32 * w + y as f32 * h) / norm;
        let [r, g, b] = lerp_rgb(start, end, t);
        Rgba([r, g, b, 255])
    })
}
