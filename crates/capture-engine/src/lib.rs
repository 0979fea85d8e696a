//! Clipdeck Capture Engine
//!
//! Turns rendered frames into a WebM asset. A [`StreamRecorder`] hands out
//! one [`RecordingHandle`] at a time; the drivers in [`session`] run the
//! per-frame loop that feeds it.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │                 record_crop / record_quote          │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────┐ │
//! │  │ VsyncSource │─▶│  Scheduler   │─▶│ Compositor │ │
//! │  └─────────────┘  └──────────────┘  └─────┬──────┘ │
//! │                                           ▼        │
//! │                              ┌──────────────────┐  │
//! │                              │ RecordingHandle  │  │
//! │                              │  (MediaRecorder) │  │
//! │                              └────────┬─────────┘  │
//! └───────────────────────────────────────┼────────────┘
//!                                         ▼
//!                                  EncodedAsset (WebM)
//! ```

pub mod pipeline;
pub mod recorder;
pub mod session;
pub mod source;

pub use pipeline::FfmpegWebmRecorder;
pub use recorder::{MediaRecorder, RecordingHandle, StreamRecorder, StreamSpec, DEFAULT_FPS};
pub use session::{
    drive, record_crop, record_quote, PacedVsync, ProgressCallback, RecordOptions, StopSignal,
    VsyncSource, CROPPED_VIDEO_NAME, QUOTE_ANIMATION_NAME,
};
pub use source::{probe_media, FfmpegVideoSource, MediaInfo};
