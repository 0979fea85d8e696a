//! ffmpeg-backed WebM encoder.
//!
//! Raw RGBA frames go in on stdin; VP8 (plus Opus when a companion audio
//! file is given) comes out of stdout in WebM. A reader thread forwards
//! stdout in the order ffmpeg writes it.

use std::io::{BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use clipdeck_common::capability::command_exists;
use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use image::RgbaImage;

use crate::recorder::{MediaRecorder, StreamSpec};

const READ_CHUNK_BYTES: usize = 64 * 1024;

enum ChunkMessage {
    Data(Vec<u8>),
    Failed(String),
}

struct RunningEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    chunks: Receiver<ChunkMessage>,
    reader: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<String>>,
}

/// [`MediaRecorder`] that pipes frames through an `ffmpeg` child process.
pub struct FfmpegWebmRecorder {
    binary: String,
    frame_len: usize,
    running: Option<RunningEncoder>,
}

impl FfmpegWebmRecorder {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            frame_len: 0,
            running: None,
        }
    }

    /// ffmpeg arguments for a stream of `spec` at `bitrate_bps`.
    pub fn build_args(spec: &StreamSpec, bitrate_bps: u32) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s:v",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(format!("{}x{}", spec.width, spec.height));
        args.push("-r".to_string());
        args.push(spec.fps.to_string());
        args.push("-i".to_string());
        args.push("pipe:0".to_string());

        if let Some(audio) = &spec.companion_audio {
            args.push("-i".to_string());
            args.push(audio.to_string_lossy().to_string());
        }

        args.push("-map".to_string());
        args.push("0:v:0".to_string());
        if spec.companion_audio.is_some() {
            args.push("-map".to_string());
            args.push("1:a?".to_string());
            args.push("-c:a".to_string());
            args.push("libopus".to_string());
            args.push("-b:a".to_string());
            args.push("128k".to_string());
            args.push("-shortest".to_string());
        } else {
            args.push("-an".to_string());
        }

        args.push("-c:v".to_string());
        args.push("libvpx".to_string());
        args.push("-b:v".to_string());
        args.push(bitrate_bps.to_string());
        args.push("-deadline".to_string());
        args.push("realtime".to_string());
        args.push("-pix_fmt".to_string());
        args.push("yuv420p".to_string());
        args.push("-f".to_string());
        args.push("webm".to_string());
        args.push("pipe:1".to_string());
        args
    }

    fn running_mut(&mut self) -> ClipdeckResult<&mut RunningEncoder> {
        self.running
            .as_mut()
            .ok_or_else(|| ClipdeckError::session("Encoder is not running"))
    }
}

impl Default for FfmpegWebmRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_chunks(chunks: &Receiver<ChunkMessage>) -> ClipdeckResult<Vec<Vec<u8>>> {
    let mut out = Vec::new();
    loop {
        match chunks.try_recv() {
            Ok(ChunkMessage::Data(bytes)) => out.push(bytes),
            Ok(ChunkMessage::Failed(e)) => {
                return Err(ClipdeckError::session(format!("Encoder output failed: {e}")))
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(out),
        }
    }
}

impl MediaRecorder for FfmpegWebmRecorder {
    fn name(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn start(&mut self, spec: &StreamSpec, bitrate_bps: u32) -> ClipdeckResult<()> {
        if self.running.is_some() {
            return Err(ClipdeckError::session("Encoder already started"));
        }
        let args = Self::build_args(spec, bitrate_bps);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ClipdeckError::capability(format!("Failed to start {}: {e}", self.binary))
            })?;

        tracing::info!(pid = child.id(), "ffmpeg encoder started");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClipdeckError::session("Failed to open ffmpeg stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClipdeckError::session("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClipdeckError::session("Failed to capture ffmpeg stderr"))?;

        let (tx, rx) = mpsc::channel();
        let reader = std::thread::spawn(move || {
            let mut stdout = stdout;
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            loop {
                match stdout.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(ChunkMessage::Data(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        let _ = tx.send(ChunkMessage::Failed(e.to_string()));
                        break;
                    }
                }
            }
        });

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        self.frame_len = spec.frame_len();
        self.running = Some(RunningEncoder {
            child,
            stdin: Some(stdin),
            chunks: rx,
            reader: Some(reader),
            stderr_task: Some(stderr_task),
        });
        Ok(())
    }

    fn write_frame(&mut self, frame: &RgbaImage) -> ClipdeckResult<()> {
        let frame_len = self.frame_len;
        let running = self.running_mut()?;
        let raw = frame.as_raw();
        if raw.len() != frame_len {
            return Err(ClipdeckError::session(format!(
                "Frame holds {} bytes, encoder expects {frame_len}",
                raw.len()
            )));
        }
        let stdin = running
            .stdin
            .as_mut()
            .ok_or_else(|| ClipdeckError::session("ffmpeg stdin already closed"))?;
        stdin
            .write_all(raw)
            .map_err(|e| ClipdeckError::session(format!("ffmpeg stopped accepting frames: {e}")))
    }

    fn drain_chunks(&mut self) -> ClipdeckResult<Vec<Vec<u8>>> {
        collect_chunks(&self.running_mut()?.chunks)
    }

    fn finish(&mut self) -> ClipdeckResult<Vec<Vec<u8>>> {
        let Some(mut running) = self.running.take() else {
            return Err(ClipdeckError::session("Encoder is not running"));
        };

        if let Some(mut stdin) = running.stdin.take() {
            stdin
                .flush()
                .map_err(|e| ClipdeckError::session(format!("Failed to flush ffmpeg stdin: {e}")))?;
        }

        let status = running
            .child
            .wait()
            .map_err(|e| ClipdeckError::session(format!("Failed waiting for ffmpeg: {e}")))?;
        if let Some(reader) = running.reader.take() {
            let _ = reader.join();
        }
        let stderr_output = running
            .stderr_task
            .take()
            .and_then(|t| t.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(ClipdeckError::session(format!(
                "ffmpeg exited with {status}: {}",
                stderr_output.trim()
            )));
        }

        let chunks = collect_chunks(&running.chunks)?;
        tracing::info!(chunks = chunks.len(), "ffmpeg encoder finished");
        Ok(chunks)
    }

    fn abort(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };
        drop(running.stdin.take());
        if let Err(e) = running.child.kill() {
            tracing::debug!(error = %e, "ffmpeg already exited");
        }
        let _ = running.child.wait();
        if let Some(reader) = running.reader.take() {
            let _ = reader.join();
        }
        if let Some(task) = running.stderr_task.take() {
            let _ = task.join();
        }
        tracing::warn!("ffmpeg encoder aborted");
    }
}

impl Drop for FfmpegWebmRecorder {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn spec(companion: Option<PathBuf>) -> StreamSpec {
        StreamSpec {
            width: 600,
            height: 300,
            fps: 30,
            companion_audio: companion,
        }
    }

    #[test]
    fn test_args_video_only() {
        let args = FfmpegWebmRecorder::build_args(&spec(None), 2_500_000);
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s:v 600x300 -r 30 -i pipe:0"));
        assert!(joined.contains("-an"));
        assert!(joined.contains("-c:v libvpx -b:v 2500000"));
        assert!(joined.ends_with("-f webm pipe:1"));
        assert!(!joined.contains("libopus"));
    }

    #[test]
    fn test_args_with_companion_audio() {
        let args =
            FfmpegWebmRecorder::build_args(&spec(Some(PathBuf::from("/clips/in.mp4"))), 1_000_000);
        let joined = args.join(" ");
        assert!(joined.contains("-i pipe:0 -i /clips/in.mp4"));
        assert!(joined.contains("-map 0:v:0 -map 1:a?"));
        assert!(joined.contains("-c:a libopus"));
        assert!(!joined.contains("-an"));
    }

    #[test]
    fn test_write_before_start_is_session_error() {
        let mut rec = FfmpegWebmRecorder::new();
        let err = rec.write_frame(&RgbaImage::new(2, 2)).unwrap_err();
        assert!(matches!(err, ClipdeckError::Session { .. }));
        assert!(rec.finish().is_err());
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let rec = FfmpegWebmRecorder {
            binary: "clipdeck-no-such-encoder".to_string(),
            frame_len: 0,
            running: None,
        };
        assert!(!rec.is_available());
    }
}
