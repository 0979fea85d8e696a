//! Frame compositors: what to draw for a given point in the session.
//!
//! A compositor owns no timing. The scheduler hands it a normalized time
//! `t` in `[0, 1]` once per tick and it fills a fixed-size surface.

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::geometry::{PixelRect, PixelSize};
use image::RgbaImage;

/// Outcome of drawing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The surface holds a new frame.
    Rendered,
    /// The source reached its end or was paused; the surface was not touched.
    SourceEnded,
}

/// Per-frame renderer into an off-screen surface of [`FrameCompositor::surface_size`].
pub trait FrameCompositor {
    /// Size of the surface this compositor draws into.
    fn surface_size(&self) -> PixelSize;

    /// Draw the frame for normalized time `t`.
    fn render_frame(&mut self, t: f64, surface: &mut RgbaImage) -> ClipdeckResult<FrameOutcome>;
}

/// A playable video exposing its current frame.
pub trait VideoSource {
    /// Native pixel dimensions.
    fn native_size(&self) -> PixelSize;

    /// Total duration in seconds.
    fn duration_secs(&self) -> f64;

    /// The frame on screen at `secs`, or `None` once playback has ended.
    fn frame_at(&mut self, secs: f64) -> ClipdeckResult<Option<&RgbaImage>>;

    /// Whether playback was paused by the user.
    fn is_paused(&self) -> bool {
        false
    }
}

/// Copies a fixed region of each source frame, 1:1, into a surface of the region's size.
pub struct CropCompositor<S> {
    source: S,
    region: PixelRect,
}

impl<S: VideoSource> CropCompositor<S> {
    /// The region must be non-empty and inside the source's native bounds.
    pub fn new(source: S, region: PixelRect) -> ClipdeckResult<Self> {
        let native = source.native_size();
        if region.w == 0 || region.h == 0 {
            return Err(ClipdeckError::invalid_input("Crop region has zero area"));
        }
        if region.x + region.w > native.width || region.y + region.h > native.height {
            return Err(ClipdeckError::invalid_input(format!(
                "Crop region {region} exceeds the {native} source"
            )));
        }
        tracing::debug!(%region, %native, "Crop compositor ready");
        Ok(Self { source, region })
    }

    pub fn region(&self) -> PixelRect {
        self.region
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: VideoSource> FrameCompositor for CropCompositor<S> {
    fn surface_size(&self) -> PixelSize {
        self.region.size()
    }

    fn render_frame(&mut self, t: f64, surface: &mut RgbaImage) -> ClipdeckResult<FrameOutcome> {
        if self.source.is_paused() {
            return Ok(FrameOutcome::SourceEnded);
        }
        let region = self.region;
        let native = self.source.native_size();
        let secs = t.clamp(0.0, 1.0) * self.source.duration_secs();

        let Some(frame) = self.source.frame_at(secs)? else {
            return Ok(FrameOutcome::SourceEnded);
        };
        if frame.width() != native.width || frame.height() != native.height {
            return Err(ClipdeckError::render(format!(
                "Source frame is {}x{}, expected {native}",
                frame.width(),
                frame.height()
            )));
        }
        if surface.width() != region.w || surface.height() != region.h {
            return Err(ClipdeckError::render(format!(
                "Surface is {}x{}, expected {}x{}",
                surface.width(),
                surface.height(),
                region.w,
                region.h
            )));
        }

        let src_stride = native.width as usize * 4;
        let row_len = region.w as usize * 4;
        let src: &[u8] = frame.as_raw();
        let dst: &mut [u8] = surface;
        for row in 0..region.h as usize {
            let s = (region.y as usize + row) * src_stride + region.x as usize * 4;
            let d = row * row_len;
            dst[d..d + row_len].copy_from_slice(&src[s..s + row_len]);
        }

        Ok(FrameOutcome::Rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Ten-second source whose pixels encode their own coordinates.
    struct CoordinateSource {
        frame: RgbaImage,
        paused: bool,
        requested: Vec<f64>,
    }

    impl CoordinateSource {
        fn new(width: u32, height: u32) -> Self {
            Self {
                frame: RgbaImage::from_fn(width, height, |x, y| {
                    Rgba([x as u8, y as u8, 0, 255])
                }),
                paused: false,
                requested: Vec::new(),
            }
        }
    }

    impl VideoSource for CoordinateSource {
        fn native_size(&self) -> PixelSize {
            PixelSize::new(self.frame.width(), self.frame.height())
        }

        fn duration_secs(&self) -> f64 {
            10.0
        }

        fn frame_at(&mut self, secs: f64) -> ClipdeckResult<Option<&RgbaImage>> {
            self.requested.push(secs);
            if secs >= 10.0 {
                return Ok(None);
            }
            Ok(Some(&self.frame))
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    }

    fn region(x: u32, y: u32, w: u32, h: u32) -> PixelRect {
        PixelRect { x, y, w, h }
    }

    #[test]
    fn test_copies_region_one_to_one() {
        let mut comp =
            CropCompositor::new(CoordinateSource::new(64, 48), region(10, 20, 8, 4)).unwrap();
        let size = comp.surface_size();
        assert_eq!(size, PixelSize::new(8, 4));

        let mut surface = RgbaImage::new(size.width, size.height);
        assert_eq!(
            comp.render_frame(0.25, &mut surface).unwrap(),
            FrameOutcome::Rendered
        );
        assert_eq!(surface.get_pixel(0, 0).0, [10, 20, 0, 255]);
        assert_eq!(surface.get_pixel(7, 3).0, [17, 23, 0, 255]);
        assert_eq!(comp.source().requested, vec![2.5]);
    }

    #[test]
    fn test_stops_at_end_of_source() {
        let mut comp =
            CropCompositor::new(CoordinateSource::new(16, 16), region(0, 0, 4, 4)).unwrap();
        let mut surface = RgbaImage::new(4, 4);
        assert_eq!(
            comp.render_frame(1.0, &mut surface).unwrap(),
            FrameOutcome::SourceEnded
        );
    }

    #[test]
    fn test_stops_when_paused() {
        let mut comp =
            CropCompositor::new(CoordinateSource::new(16, 16), region(0, 0, 4, 4)).unwrap();
        comp.source_mut().paused = true;
        let mut surface = RgbaImage::new(4, 4);
        assert_eq!(
            comp.render_frame(0.1, &mut surface).unwrap(),
            FrameOutcome::SourceEnded
        );
        assert!(comp.source().requested.is_empty());
    }

    #[test]
    fn test_rejects_out_of_bounds_region() {
        assert!(CropCompositor::new(CoordinateSource::new(16, 16), region(10, 0, 8, 4)).is_err());
        assert!(CropCompositor::new(CoordinateSource::new(16, 16), region(0, 0, 0, 4)).is_err());
    }

    #[test]
    fn test_wrong_surface_size_is_render_error() {
        let mut comp =
            CropCompositor::new(CoordinateSource::new(16, 16), region(0, 0, 4, 4)).unwrap();
        let mut surface = RgbaImage::new(5, 4);
        assert!(comp.render_frame(0.0, &mut surface).is_err());
    }
}
