//! Recording drivers.
//!
//! One cooperative loop per session: wait for the next frame slot, ask the
//! scheduler how far along we are, draw, hand the frame to the recorder,
//! report progress. Frame decoding and encoder writes block on pipes, so on
//! a multi-threaded runtime they run under `block_in_place`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clipdeck_common::clock::{RateController, RecordingClock};
use clipdeck_common::config::Quality;
use clipdeck_common::error::ClipdeckResult;
use clipdeck_media_model::asset::EncodedAsset;
use clipdeck_media_model::geometry::PixelRect;
use clipdeck_processing_core::scheduler::{AnimationScheduler, Tick};
use clipdeck_render_engine::{
    CropCompositor, FrameCompositor, FrameOutcome, GlyphPainter, QuoteCompositor, QuoteScene,
    VideoSource,
};
use image::RgbaImage;
use tokio::runtime::RuntimeFlavor;

use crate::recorder::{MediaRecorder, RecordingHandle, StreamRecorder};

pub const CROPPED_VIDEO_NAME: &str = "cropped-video.webm";
pub const QUOTE_ANIMATION_NAME: &str = "quote-animation.webm";

/// Called with session progress in `[0, 1]` after every frame.
pub type ProgressCallback = Box<dyn Fn(f64) + Send>;

/// Source of frame timestamps, in milliseconds.
#[async_trait]
pub trait VsyncSource: Send {
    /// Wait until the next frame is due and return its timestamp.
    async fn next_frame(&mut self) -> f64;
}

/// Wall-clock frame pacing at a fixed rate.
#[derive(Debug)]
pub struct PacedVsync {
    clock: RecordingClock,
    rate: RateController,
}

impl PacedVsync {
    pub fn new(fps: u32) -> Self {
        let clock = RecordingClock::start();
        tracing::debug!(epoch = clock.epoch_wall(), fps, "Frame clock started");
        Self {
            clock,
            rate: RateController::new(fps),
        }
    }
}

#[async_trait]
impl VsyncSource for PacedVsync {
    async fn next_frame(&mut self) -> f64 {
        loop {
            let now_ns = self.clock.elapsed_ns();
            if self.rate.should_tick(now_ns) {
                return RecordingClock::ns_to_ms(now_ns);
            }
            tokio::time::sleep(Duration::from_nanos(self.rate.wait_ns(now_ns))).await;
        }
    }
}

/// Asks a running recording to wrap up after the current frame.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-recording choices made before the session starts.
#[derive(Default)]
pub struct RecordOptions {
    pub quality: Quality,
    /// Media file whose audio is muxed into the output.
    pub companion_audio: Option<PathBuf>,
    pub progress: Option<ProgressCallback>,
    /// Ends the session early; frames recorded so far are kept.
    pub stop: Option<StopSignal>,
}

/// Run pipe I/O without stalling other tasks on a worker thread.
fn blocking<R>(f: impl FnOnce() -> R) -> R {
    match tokio::runtime::Handle::try_current() {
        Ok(rt) if rt.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

/// Record the `region` of `source` from start to end of playback.
pub async fn record_crop<S: VideoSource>(
    source: S,
    region: PixelRect,
    recorder: &StreamRecorder,
    encoder: Box<dyn MediaRecorder>,
    vsync: &mut dyn VsyncSource,
    options: RecordOptions,
) -> ClipdeckResult<EncodedAsset> {
    let duration_secs = source.duration_secs();
    let mut compositor = CropCompositor::new(source, region)?;
    let scheduler = AnimationScheduler::for_media(duration_secs);

    tracing::info!(
        %region,
        crop = %region.crop_command(),
        duration_secs,
        "Starting crop recording"
    );

    let spec = recorder.stream_spec(compositor.surface_size(), options.companion_audio);
    let mut handle = recorder.start(encoder, spec, options.quality, CROPPED_VIDEO_NAME)?;
    drive(
        &mut compositor,
        scheduler,
        &mut handle,
        vsync,
        options.progress.as_ref(),
        options.stop.as_ref(),
    )
    .await
}

/// Record one full run of the quote animation.
pub async fn record_quote<P: GlyphPainter>(
    scene: QuoteScene,
    painter: P,
    recorder: &StreamRecorder,
    encoder: Box<dyn MediaRecorder>,
    vsync: &mut dyn VsyncSource,
    options: RecordOptions,
) -> ClipdeckResult<EncodedAsset> {
    let duration_ms = scene.duration_ms as f64;
    let theme = scene.theme.name;
    let mut compositor = QuoteCompositor::new(scene, painter)?;
    let scheduler = AnimationScheduler::for_animation(duration_ms);

    tracing::info!(theme, duration_ms, "Starting quote recording");

    let spec = recorder.stream_spec(compositor.surface_size(), options.companion_audio);
    let mut handle = recorder.start(encoder, spec, options.quality, QUOTE_ANIMATION_NAME)?;
    drive(
        &mut compositor,
        scheduler,
        &mut handle,
        vsync,
        options.progress.as_ref(),
        options.stop.as_ref(),
    )
    .await
}

/// Run the frame loop until the scheduler, the compositor or `stop` ends it.
pub async fn drive<C: FrameCompositor + ?Sized>(
    compositor: &mut C,
    mut scheduler: AnimationScheduler,
    handle: &mut RecordingHandle,
    vsync: &mut dyn VsyncSource,
    progress: Option<&ProgressCallback>,
    stop: Option<&StopSignal>,
) -> ClipdeckResult<EncodedAsset> {
    let size = compositor.surface_size();
    let mut surface = RgbaImage::new(size.width, size.height);

    let mut now_ms = vsync.next_frame().await;
    if let Err(e) = scheduler.start(now_ms) {
        return Err(handle.abort(e));
    }

    loop {
        if stop.is_some_and(StopSignal::is_triggered) {
            tracing::info!(elapsed_ms = scheduler.elapsed_ms(), "Stop requested");
            break;
        }
        let Tick::Frame {
            progress: t,
            is_last,
            ..
        } = scheduler.tick(now_ms)
        else {
            break;
        };

        match blocking(|| compositor.render_frame(t, &mut surface)) {
            Ok(FrameOutcome::Rendered) => blocking(|| handle.write_frame(&surface))?,
            Ok(FrameOutcome::SourceEnded) => {
                tracing::debug!(progress = t, "Source ended");
                break;
            }
            Err(e) => return Err(handle.abort(e)),
        }

        handle.set_progress(t);
        if let Some(cb) = progress {
            cb(t);
        }
        if is_last {
            break;
        }
        now_ms = vsync.next_frame().await;
    }

    scheduler.stop();
    tracing::debug!(
        frames = scheduler.frames_scheduled(),
        elapsed_ms = scheduler.elapsed_ms(),
        "Frame loop finished"
    );
    handle.stop().await
}
