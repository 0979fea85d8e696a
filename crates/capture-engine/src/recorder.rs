//! Start/stop recording over a [`MediaRecorder`].
//!
//! [`StreamRecorder::start`] hands back a [`RecordingHandle`] that owns the
//! encoder for the rest of the session. Chunks are appended in arrival
//! order and only joined into one blob on [`RecordingHandle::stop`]. Any
//! encoder error aborts the session and drops what was collected so far.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clipdeck_common::config::{BitrateTiers, Quality, RecordingDefaults};
use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::asset::{ContainerKind, EncodedAsset};
use clipdeck_media_model::geometry::PixelSize;
use clipdeck_media_model::session::{RecordingSession, SessionStatus};
use image::RgbaImage;

/// Target frame rate for every recording.
pub const DEFAULT_FPS: u32 = 30;

/// Shape of the stream handed to the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Media file whose audio track is muxed alongside the video.
    pub companion_audio: Option<PathBuf>,
}

impl StreamSpec {
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Bytes in one RGBA frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Platform encoder that turns RGBA frames into WebM chunks.
pub trait MediaRecorder: Send {
    /// Encoder name for logs.
    fn name(&self) -> &str;

    /// Whether the encoder can run on this host.
    fn is_available(&self) -> bool;

    /// Begin encoding a stream of `spec` at `bitrate_bps`.
    fn start(&mut self, spec: &StreamSpec, bitrate_bps: u32) -> ClipdeckResult<()>;

    /// Queue one frame.
    fn write_frame(&mut self, frame: &RgbaImage) -> ClipdeckResult<()>;

    /// Chunks emitted since the last call, oldest first.
    fn drain_chunks(&mut self) -> ClipdeckResult<Vec<Vec<u8>>>;

    /// Flush the encoder and return the remaining chunks.
    fn finish(&mut self) -> ClipdeckResult<Vec<Vec<u8>>>;

    /// Tear down without producing output.
    fn abort(&mut self);
}

/// Hands out recording sessions, at most one at a time.
#[derive(Debug, Clone)]
pub struct StreamRecorder {
    bitrates: BitrateTiers,
    fps: u32,
    active: Arc<AtomicBool>,
}

impl StreamRecorder {
    pub fn new(bitrates: BitrateTiers, fps: u32) -> Self {
        Self {
            bitrates,
            fps: fps.max(1),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(defaults: &RecordingDefaults) -> Self {
        Self::new(defaults.bitrates, defaults.fps)
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn bitrate_for(&self, quality: Quality) -> u32 {
        self.bitrates.for_quality(quality)
    }

    /// Whether a session is currently recording.
    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stream spec for a surface of `size` at this recorder's frame rate.
    pub fn stream_spec(&self, size: PixelSize, companion_audio: Option<PathBuf>) -> StreamSpec {
        StreamSpec {
            width: size.width,
            height: size.height,
            fps: self.fps,
            companion_audio,
        }
    }

    /// Start a session. The asset produced on stop is named `file_name`.
    pub fn start(
        &self,
        mut recorder: Box<dyn MediaRecorder>,
        spec: StreamSpec,
        quality: Quality,
        file_name: impl Into<String>,
    ) -> ClipdeckResult<RecordingHandle> {
        if !recorder.is_available() {
            return Err(ClipdeckError::capability(format!(
                "Video recording is unavailable ({} is not installed)",
                recorder.name()
            )));
        }
        if spec.width == 0 || spec.height == 0 {
            return Err(ClipdeckError::invalid_input(format!(
                "Cannot record a {}x{} surface",
                spec.width, spec.height
            )));
        }
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClipdeckError::session(
                "Another recording is already in progress",
            ));
        }

        let bitrate_bps = self.bitrates.for_quality(quality);
        if let Err(e) = recorder.start(&spec, bitrate_bps) {
            self.active.store(false, Ordering::SeqCst);
            return Err(e);
        }

        let mut session = RecordingSession::new();
        session.begin()?;

        tracing::info!(
            recorder = recorder.name(),
            width = spec.width,
            height = spec.height,
            fps = spec.fps,
            bitrate_bps,
            ?quality,
            "Recording started"
        );

        Ok(RecordingHandle {
            recorder: Some(recorder),
            spec,
            session,
            chunks: Vec::new(),
            frames_written: 0,
            outcome: None,
            file_name: file_name.into(),
            active: Arc::clone(&self.active),
        })
    }
}

impl Default for StreamRecorder {
    fn default() -> Self {
        Self::new(BitrateTiers::default(), DEFAULT_FPS)
    }
}

/// One running (or finished) recording session.
pub struct RecordingHandle {
    recorder: Option<Box<dyn MediaRecorder>>,
    spec: StreamSpec,
    session: RecordingSession,
    chunks: Vec<Vec<u8>>,
    frames_written: u64,
    outcome: Option<ClipdeckResult<EncodedAsset>>,
    file_name: String,
    active: Arc<AtomicBool>,
}

impl RecordingHandle {
    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn spec(&self) -> &StreamSpec {
        &self.spec
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Bytes collected so far.
    pub fn buffered_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.session.set_progress(progress);
    }

    /// Feed one rendered frame to the encoder.
    pub fn write_frame(&mut self, frame: &RgbaImage) -> ClipdeckResult<()> {
        if let Some(outcome) = &self.outcome {
            return Err(match outcome {
                Err(e) => e.clone(),
                Ok(_) => ClipdeckError::session("Recording already stopped"),
            });
        }
        if frame.dimensions() != (self.spec.width, self.spec.height) {
            return Err(self.abort(ClipdeckError::session(format!(
                "Frame is {}x{}, stream is {}",
                frame.width(),
                frame.height(),
                self.spec.size()
            ))));
        }
        let Some(recorder) = self.recorder.as_mut() else {
            return Err(ClipdeckError::session("Recorder is gone"));
        };

        let result = recorder
            .write_frame(frame)
            .and_then(|()| recorder.drain_chunks());
        match result {
            Ok(chunks) => {
                self.chunks.extend(chunks);
                self.frames_written += 1;
                Ok(())
            }
            Err(e) => Err(self.abort(e)),
        }
    }

    /// Fail the session: tear down the encoder and discard collected chunks.
    ///
    /// Returns the terminal error, which later calls to [`Self::stop`] repeat.
    pub fn abort(&mut self, error: ClipdeckError) -> ClipdeckError {
        if let Some(Err(existing)) = &self.outcome {
            return existing.clone();
        }
        let error = match error {
            e @ ClipdeckError::Session { .. } => e,
            other => ClipdeckError::session(other.to_string()),
        };

        if let Some(mut recorder) = self.recorder.take() {
            recorder.abort();
        }
        let discarded = self.buffered_bytes();
        self.chunks.clear();
        self.session.fail();
        self.active.store(false, Ordering::SeqCst);
        self.outcome = Some(Err(error.clone()));

        tracing::error!(error = %error, discarded, "Recording aborted");
        error
    }

    /// Finish the session and join every chunk into one asset.
    ///
    /// Calling this again returns the same asset (or the same error) without
    /// touching the encoder.
    pub async fn stop(&mut self) -> ClipdeckResult<EncodedAsset> {
        if let Some(outcome) = &self.outcome {
            tracing::debug!("Recording already stopped; returning cached result");
            return outcome.clone();
        }
        let Some(mut recorder) = self.recorder.take() else {
            return Err(ClipdeckError::session("Recorder is gone"));
        };

        let name = recorder.name().to_string();
        let mut guard = StopGuard {
            handle: &mut *self,
            armed: true,
        };
        let finished = tokio::task::spawn_blocking(move || recorder.finish())
            .await
            .map_err(|e| ClipdeckError::session(format!("Encoder task failed: {e}")))
            .and_then(|r| r);
        guard.armed = false;
        drop(guard);

        let tail = match finished {
            Ok(tail) => tail,
            Err(e) => return Err(self.abort(e)),
        };
        self.chunks.extend(tail);

        if self.chunks.is_empty() {
            return Err(self.abort(ClipdeckError::session(format!(
                "{name} produced no data"
            ))));
        }

        let mut bytes = Vec::with_capacity(self.buffered_bytes());
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(&chunk);
        }
        let asset = EncodedAsset::new(bytes, ContainerKind::Webm, self.file_name.clone());

        self.session.finish();
        self.active.store(false, Ordering::SeqCst);
        self.outcome = Some(Ok(asset.clone()));

        tracing::info!(
            recorder = %name,
            frames = self.frames_written,
            bytes = asset.len(),
            file_name = asset.file_name(),
            "Recording stopped"
        );
        Ok(asset)
    }
}

/// Fails the session if [`RecordingHandle::stop`] is cancelled while the
/// encoder is flushing.
struct StopGuard<'a> {
    handle: &'a mut RecordingHandle,
    armed: bool,
}

impl Drop for StopGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.handle
                .abort(ClipdeckError::session("Recording was interrupted while stopping"));
        }
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        if self.outcome.is_none() {
            tracing::warn!("Recording dropped without stop; discarding output");
            if let Some(mut recorder) = self.recorder.take() {
                recorder.abort();
            }
            self.session.fail();
            self.active.store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Counts calls; each frame becomes one chunk holding the frame index.
    #[derive(Debug, Default)]
    pub(crate) struct CallLog {
        pub started: u32,
        pub frames: u32,
        pub finished: u32,
        pub aborted: u32,
        pub bitrate_bps: u32,
    }

    pub(crate) struct MemoryRecorder {
        pub log: Arc<Mutex<CallLog>>,
        pub available: bool,
        pub fail_on_frame: Option<u32>,
        pending: Vec<Vec<u8>>,
    }

    impl MemoryRecorder {
        pub fn new() -> (Self, Arc<Mutex<CallLog>>) {
            let log = Arc::new(Mutex::new(CallLog::default()));
            (
                Self {
                    log: Arc::clone(&log),
                    available: true,
                    fail_on_frame: None,
                    pending: Vec::new(),
                },
                log,
            )
        }
    }

    impl MediaRecorder for MemoryRecorder {
        fn name(&self) -> &str {
            "memory"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn start(&mut self, _spec: &StreamSpec, bitrate_bps: u32) -> ClipdeckResult<()> {
            let mut log = self.log.lock().unwrap();
            log.started += 1;
            log.bitrate_bps = bitrate_bps;
            Ok(())
        }

        fn write_frame(&mut self, _frame: &RgbaImage) -> ClipdeckResult<()> {
            let mut log = self.log.lock().unwrap();
            if self.fail_on_frame == Some(log.frames) {
                return Err(ClipdeckError::session("encoder crashed"));
            }
            self.pending.push(vec![log.frames as u8]);
            log.frames += 1;
            Ok(())
        }

        fn drain_chunks(&mut self) -> ClipdeckResult<Vec<Vec<u8>>> {
            Ok(std::mem::take(&mut self.pending))
        }

        fn finish(&mut self) -> ClipdeckResult<Vec<Vec<u8>>> {
            self.log.lock().unwrap().finished += 1;
            Ok(vec![b"END".to_vec()])
        }

        fn abort(&mut self) {
            self.log.lock().unwrap().aborted += 1;
        }
    }

    fn spec() -> StreamSpec {
        StreamRecorder::default().stream_spec(PixelSize::new(4, 2), None)
    }

    #[tokio::test]
    async fn test_stop_twice_returns_same_asset() {
        let (rec, log) = MemoryRecorder::new();
        let recorder = StreamRecorder::default();
        let mut handle = recorder
            .start(Box::new(rec), spec(), Quality::Medium, "clip.webm")
            .unwrap();
        handle.write_frame(&RgbaImage::new(4, 2)).unwrap();

        let first = handle.stop().await.unwrap();
        let second = handle.stop().await.unwrap();

        assert!(first.shares_bytes_with(&second));
        assert_eq!(first.bytes(), &[0, b'E', b'N', b'D']);
        assert_eq!(first.mime_type(), "video/webm");
        assert_eq!(log.lock().unwrap().finished, 1);
        assert_eq!(handle.status(), SessionStatus::Stopped);
        assert_eq!(handle.session().progress(), 1.0);
    }

    #[tokio::test]
    async fn test_chunks_kept_in_arrival_order() {
        let (rec, _log) = MemoryRecorder::new();
        let mut handle = StreamRecorder::default()
            .start(Box::new(rec), spec(), Quality::Low, "clip.webm")
            .unwrap();
        for _ in 0..5 {
            handle.write_frame(&RgbaImage::new(4, 2)).unwrap();
        }
        let asset = handle.stop().await.unwrap();
        assert_eq!(&asset.bytes()[..5], &[0, 1, 2, 3, 4]);
        assert_eq!(handle.frames_written(), 5);
    }

    #[test]
    fn test_unavailable_recorder_is_capability_error() {
        let (mut rec, log) = MemoryRecorder::new();
        rec.available = false;
        let recorder = StreamRecorder::default();
        let err = recorder
            .start(Box::new(rec), spec(), Quality::Medium, "clip.webm")
            .err()
            .unwrap();
        assert!(matches!(err, ClipdeckError::Capability { .. }));
        assert_eq!(log.lock().unwrap().started, 0);
        assert!(!recorder.is_busy());
    }

    #[test]
    fn test_only_one_session_at_a_time() {
        let recorder = StreamRecorder::default();
        let (a, _) = MemoryRecorder::new();
        let (b, _) = MemoryRecorder::new();
        let first = recorder
            .start(Box::new(a), spec(), Quality::Medium, "a.webm")
            .unwrap();
        let err = recorder
            .start(Box::new(b), spec(), Quality::Medium, "b.webm")
            .err()
            .unwrap();
        assert!(matches!(err, ClipdeckError::Session { .. }));

        drop(first);
        assert!(!recorder.is_busy());
    }

    #[test]
    fn test_quality_selects_bitrate() {
        let (rec, log) = MemoryRecorder::new();
        let _handle = StreamRecorder::default()
            .start(Box::new(rec), spec(), Quality::High, "clip.webm")
            .unwrap();
        assert_eq!(log.lock().unwrap().bitrate_bps, 5_000_000);
    }

    #[tokio::test]
    async fn test_encoder_error_fails_session_and_discards() {
        let (mut rec, log) = MemoryRecorder::new();
        rec.fail_on_frame = Some(2);
        let recorder = StreamRecorder::default();
        let mut handle = recorder
            .start(Box::new(rec), spec(), Quality::Medium, "clip.webm")
            .unwrap();

        handle.write_frame(&RgbaImage::new(4, 2)).unwrap();
        handle.write_frame(&RgbaImage::new(4, 2)).unwrap();
        let err = handle.write_frame(&RgbaImage::new(4, 2)).unwrap_err();
        assert!(matches!(err, ClipdeckError::Session { .. }));
        assert_eq!(handle.status(), SessionStatus::Failed);
        assert_eq!(handle.buffered_bytes(), 0);
        assert!(!recorder.is_busy());

        let stop_err = handle.stop().await.unwrap_err();
        assert_eq!(stop_err.to_string(), err.to_string());
        let log = log.lock().unwrap();
        assert_eq!(log.aborted, 1);
        assert_eq!(log.finished, 0);
    }

    /// Takes longer to flush than callers are willing to wait.
    struct SlowRecorder;

    impl MediaRecorder for SlowRecorder {
        fn name(&self) -> &str {
            "slow"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn start(&mut self, _spec: &StreamSpec, _bitrate_bps: u32) -> ClipdeckResult<()> {
            Ok(())
        }

        fn write_frame(&mut self, _frame: &RgbaImage) -> ClipdeckResult<()> {
            Ok(())
        }

        fn drain_chunks(&mut self) -> ClipdeckResult<Vec<Vec<u8>>> {
            Ok(vec![vec![1]])
        }

        fn finish(&mut self) -> ClipdeckResult<Vec<Vec<u8>>> {
            std::thread::sleep(std::time::Duration::from_millis(300));
            Ok(Vec::new())
        }

        fn abort(&mut self) {}
    }

    #[tokio::test]
    async fn test_cancelled_stop_fails_session_and_frees_recorder() {
        let recorder = StreamRecorder::default();
        let mut handle = recorder
            .start(Box::new(SlowRecorder), spec(), Quality::Medium, "clip.webm")
            .unwrap();
        handle.write_frame(&RgbaImage::new(4, 2)).unwrap();

        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), handle.stop()).await;
        assert!(timed_out.is_err());

        assert_eq!(handle.status(), SessionStatus::Failed);
        assert!(!recorder.is_busy());
        let first = handle.stop().await.unwrap_err();
        let second = handle.stop().await.unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert!(first.to_string().contains("interrupted"));

        drop(handle);
        let (rec, _) = MemoryRecorder::new();
        assert!(recorder
            .start(Box::new(rec), spec(), Quality::Medium, "next.webm")
            .is_ok());
    }

    #[test]
    fn test_drop_without_stop_frees_recorder() {
        let recorder = StreamRecorder::default();
        let (rec, log) = MemoryRecorder::new();
        let handle = recorder
            .start(Box::new(rec), spec(), Quality::Medium, "clip.webm")
            .unwrap();
        drop(handle);
        assert!(!recorder.is_busy());
        assert_eq!(log.lock().unwrap().aborted, 1);
    }

    #[test]
    fn test_wrong_frame_size_aborts() {
        let (rec, _) = MemoryRecorder::new();
        let mut handle = StreamRecorder::default()
            .start(Box::new(rec), spec(), Quality::Medium, "clip.webm")
            .unwrap();
        assert!(handle.write_frame(&RgbaImage::new(3, 2)).is_err());
        assert_eq!(handle.status(), SessionStatus::Failed);
    }
}
