//! Video playback source decoded by ffmpeg.

use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clipdeck_common::capability::command_exists;
use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::geometry::PixelSize;
use clipdeck_render_engine::VideoSource;
use image::RgbaImage;
use serde::Deserialize;

/// What ffprobe reports about a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub native: PixelSize,
    pub duration_secs: f64,
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Run ffprobe on `path`.
pub fn probe_media(path: &Path) -> ClipdeckResult<MediaInfo> {
    if !path.exists() {
        return Err(ClipdeckError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !command_exists("ffprobe") {
        return Err(ClipdeckError::capability(
            "Cannot read video files (ffprobe is not installed)",
        ));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,width,height:format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| ClipdeckError::capability(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ClipdeckError::invalid_input(format!(
            "Unsupported or corrupt video file: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_output(json: &str) -> ClipdeckResult<MediaInfo> {
    let probe: ProbeOutput = serde_json::from_str(json)?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ClipdeckError::invalid_input("File has no video stream"))?;
    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(ClipdeckError::invalid_input(
                "Video stream has no usable dimensions",
            ))
        }
    };

    let duration_secs = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ClipdeckError::invalid_input("Video has no known duration"))?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaInfo {
        native: PixelSize::new(width, height),
        duration_secs,
        has_audio,
    })
}

/// Plays a video file forward, one RGBA frame at a time.
///
/// Frames are decoded at a constant rate, so the frame for time `s` is
/// frame `floor(s * fps)`. Requests only move forward; asking for an
/// earlier time returns the current frame again.
pub struct FfmpegVideoSource {
    path: PathBuf,
    info: MediaInfo,
    fps: u32,
    child: Child,
    stdout: BufReader<ChildStdout>,
    frame: RgbaImage,
    /// Index of the frame held in `frame`, if one has been read.
    frame_index: Option<u64>,
    ended: bool,
    paused: Arc<AtomicBool>,
}

impl FfmpegVideoSource {
    pub fn open(path: &Path, fps: u32) -> ClipdeckResult<Self> {
        let info = probe_media(path)?;
        if !command_exists("ffmpeg") {
            return Err(ClipdeckError::capability(
                "Cannot decode video (ffmpeg is not installed)",
            ));
        }
        let fps = fps.max(1);

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "-r"])
            .arg(fps.to_string())
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ClipdeckError::capability(format!("Failed to start ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipdeckError::render("Failed to capture ffmpeg stdout"))?;

        tracing::info!(
            path = %path.display(),
            native = %info.native,
            duration_secs = info.duration_secs,
            has_audio = info.has_audio,
            fps,
            "Video source opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            frame: RgbaImage::new(info.native.width, info.native.height),
            info,
            fps,
            child,
            stdout: BufReader::new(stdout),
            frame_index: None,
            ended: false,
            paused: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &MediaInfo {
        &self.info
    }

    /// Shared flag; setting it makes the source report itself paused.
    pub fn pause_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.paused)
    }

    fn read_next(&mut self) -> ClipdeckResult<bool> {
        let buf: &mut [u8] = &mut self.frame;
        match self.stdout.read_exact(buf) {
            Ok(()) => {
                self.frame_index = Some(self.frame_index.map_or(0, |i| i + 1));
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.ended = true;
                Ok(false)
            }
            Err(e) => Err(ClipdeckError::session(format!("Video decode failed: {e}"))),
        }
    }
}

impl VideoSource for FfmpegVideoSource {
    fn native_size(&self) -> PixelSize {
        self.info.native
    }

    fn duration_secs(&self) -> f64 {
        self.info.duration_secs
    }

    fn frame_at(&mut self, secs: f64) -> ClipdeckResult<Option<&RgbaImage>> {
        if secs >= self.info.duration_secs {
            self.ended = true;
        }
        if self.ended {
            return Ok(None);
        }
        let wanted = (secs.max(0.0) * self.fps as f64).floor() as u64;
        while self.frame_index.map_or(true, |i| i < wanted) {
            if !self.read_next()? {
                return Ok(None);
            }
        }
        Ok(Some(&self.frame))
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl Drop for FfmpegVideoSource {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            tracing::debug!(error = %e, "ffmpeg decoder already exited");
        }
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_with_audio() {
        let json = r#"{
            "programs": [],
            "streams": [
                {"codec_type": "video", "width": 3840, "height": 2160},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "12.500000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.native, PixelSize::new(3840, 2160));
        assert_eq!(info.duration_secs, 12.5);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_without_video() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        let err = parse_probe_output(json).unwrap_err();
        assert!(matches!(err, ClipdeckError::InvalidInput { .. }));
    }

    #[test]
    fn test_parse_probe_without_duration() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 480}], "format": {}}"#;
        assert!(parse_probe_output(json).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = probe_media(Path::new("/nonexistent/clip.mp4")).unwrap_err();
        assert!(matches!(err, ClipdeckError::FileNotFound { .. }));
    }
}
