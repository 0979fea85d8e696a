//! Crop rectangles in display space and native source space.
//!
//! A selection is drawn on the preview surface as a [`DisplayRect`], mapped
//! per axis into a [`SourceRect`] by [`CoordinateMapper`], and rounded to a
//! [`PixelRect`] before it is used for capture or shown as a crop command.

use std::fmt;

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use serde::{Deserialize, Serialize};

/// A point on the preview surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Laid-out size of the preview surface, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether the surface has been laid out with a non-zero area.
    pub fn is_laid_out(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Native resolution of a media source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rectangle on the preview surface. `(x, y)` is always the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl DisplayRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Zero-size rectangle anchored at `p`.
    pub fn at(p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            w: 0.0,
            h: 0.0,
        }
    }

    /// Bounding box of two corner points, independent of drag direction.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (a.x - b.x).abs(),
            h: (a.y - b.y).abs(),
        }
    }

    /// True when width or height is zero.
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// A rectangle in native source pixels, before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl SourceRect {
    /// Round to integer pixels, keeping the result inside `native`.
    pub fn to_pixels(&self, native: PixelSize) -> PixelRect {
        let x = (self.x.round().max(0.0) as u32).min(native.width);
        let y = (self.y.round().max(0.0) as u32).min(native.height);
        let w = (self.w.round().max(0.0) as u32).min(native.width - x);
        let h = (self.h.round().max(0.0) as u32).min(native.height - y);
        PixelRect { x, y, w, h }
    }

    /// Rounded rectangle, rejected when it would capture zero pixels.
    pub fn require_capturable(&self, native: PixelSize) -> ClipdeckResult<PixelRect> {
        let rect = self.to_pixels(native);
        if rect.w == 0 || rect.h == 0 {
            return Err(ClipdeckError::invalid_input(format!(
                "Selection has zero area ({}x{} px); drag out a larger region",
                rect.w, rect.h
            )));
        }
        Ok(rect)
    }
}

/// An integer-pixel rectangle in native source space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    /// `crop=<w>:<h>:<x>:<y>`, reproducible with the ffmpeg `crop` filter.
    pub fn crop_command(&self) -> String {
        format!("crop={}:{}:{}:{}", self.w, self.h, self.x, self.y)
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.w, self.h)
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.crop_command())
    }
}

/// Maps display-space rectangles into native source space.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateMapper;

impl CoordinateMapper {
    /// Scale `rect` by `native / display` independently on each axis.
    ///
    /// No aspect-ratio correction is applied: a stretched preview maps with
    /// a stretched scale. The result is clamped into `[0, native]`.
    /// `display` must be laid out (both sides > 0).
    pub fn to_source(rect: &DisplayRect, display: Size, native: PixelSize) -> SourceRect {
        debug_assert!(display.is_laid_out(), "mapping requires a laid-out surface");

        let native_w = native.width as f64;
        let native_h = native.height as f64;
        let scale_x = native_w / display.width;
        let scale_y = native_h / display.height;

        // Clamp both edges so an overhang on either side shrinks the rect.
        let x0 = (rect.x * scale_x).clamp(0.0, native_w);
        let y0 = (rect.y * scale_y).clamp(0.0, native_h);
        let x1 = ((rect.x + rect.w) * scale_x).clamp(x0, native_w);
        let y1 = ((rect.y + rect.h) * scale_y).clamp(y0, native_h);

        SourceRect {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        }
    }
}
