//! Audio decoding.
//!
//! Decoding is the one awaited step of the vocal-removal pipeline; the
//! CPU-bound work runs on the blocking pool so the caller's runtime stays
//! responsive while a long file is parsed.

use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use clipdeck_common::capability::command_exists;
use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::audio::AudioBuffer;
use hound::{SampleFormat, WavReader};

/// Turns raw file bytes into a decoded [`AudioBuffer`].
#[async_trait]
pub trait AudioDecoder: Send + Sync {
    /// Whether the decoder can run on this host.
    fn is_available(&self) -> bool;

    /// Decoder name for logs.
    fn name(&self) -> &str;

    /// Decode a complete file held in memory.
    async fn decode(&self, bytes: Vec<u8>) -> ClipdeckResult<AudioBuffer>;
}

/// In-process decoder for RIFF/WAVE files.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

#[async_trait]
impl AudioDecoder for WavDecoder {
    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "hound"
    }

    async fn decode(&self, bytes: Vec<u8>) -> ClipdeckResult<AudioBuffer> {
        tokio::task::spawn_blocking(move || decode_wav_bytes(&bytes))
            .await
            .map_err(|e| ClipdeckError::audio(format!("Decode task failed: {e}")))?
    }
}

/// Decoder for any format ffmpeg understands, via an intermediate float WAV.
#[derive(Debug, Clone)]
pub struct FfmpegAudioDecoder {
    binary: String,
}

impl FfmpegAudioDecoder {
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

impl Default for FfmpegAudioDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioDecoder for FfmpegAudioDecoder {
    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn decode(&self, bytes: Vec<u8>) -> ClipdeckResult<AudioBuffer> {
        let binary = self.binary.clone();
        tokio::task::spawn_blocking(move || {
            let wav = transcode_to_float_wav(&binary, &bytes)?;
            decode_wav_bytes(&wav)
        })
        .await
        .map_err(|e| ClipdeckError::audio(format!("Decode task failed: {e}")))?
    }
}

/// True for bytes that start with a RIFF/WAVE preamble.
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Pick the cheapest decoder that can handle `bytes`.
pub fn decoder_for(bytes: &[u8]) -> Box<dyn AudioDecoder> {
    if is_wav(bytes) {
        Box::new(WavDecoder)
    } else {
        Box::new(FfmpegAudioDecoder::new())
    }
}

/// Parse an in-memory WAV file into planar float channels.
pub fn decode_wav_bytes(bytes: &[u8]) -> ClipdeckResult<AudioBuffer> {
    let mut reader = WavReader::new(Cursor::new(bytes)).map_err(|e| {
        ClipdeckError::invalid_input(format!("Unsupported or corrupt audio file: {e}"))
    })?;
    let spec = reader.spec();

    tracing::debug!(
        sample_rate = spec.sample_rate,
        channels = spec.channels,
        bits = spec.bits_per_sample,
        "Reading WAV data"
    );

    let corrupt = |e: hound::Error| {
        ClipdeckError::invalid_input(format!("Unsupported or corrupt audio file: {e}"))
    };

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(corrupt)?,
        (SampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => {
            let full_scale = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(corrupt)?
        }
        (format, bits) => {
            return Err(ClipdeckError::invalid_input(format!(
                "Unsupported WAV sample format: {format:?} {bits}-bit"
            )));
        }
    };

    AudioBuffer::from_interleaved(spec.sample_rate, spec.channels, &samples)
}

/// Run ffmpeg over `bytes`, returning a float32 WAV file.
fn transcode_to_float_wav(binary: &str, bytes: &[u8]) -> ClipdeckResult<Vec<u8>> {
    // ffmpeg needs a seekable output to write correct WAV sizes.
    let output_path = scratch_path("decode.wav");

    let mut child = Command::new(binary)
        .args(["-v", "error", "-y", "-i", "pipe:0", "-vn", "-acodec", "pcm_f32le", "-f", "wav"])
        .arg(&output_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ClipdeckError::capability(format!("Failed to start {binary}: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ClipdeckError::audio("Failed to open decoder stdin"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ClipdeckError::audio("Failed to capture decoder stderr"))?;

    let input = bytes.to_vec();
    let writer = std::thread::spawn(move || {
        // A closed pipe here means ffmpeg gave up; its exit status reports why.
        let _ = stdin.write_all(&input);
    });
    let stderr_task = std::thread::spawn(move || -> String {
        let mut output = String::new();
        let _ = stderr.read_to_string(&mut output);
        output
    });

    let status = child
        .wait()
        .map_err(|e| ClipdeckError::audio(format!("Failed to wait on decoder: {e}")))?;
    let _ = writer.join();
    let stderr_output = stderr_task.join().unwrap_or_default();

    if !status.success() {
        let _ = std::fs::remove_file(&output_path);
        return Err(ClipdeckError::invalid_input(format!(
            "Unsupported or corrupt audio file: {}",
            stderr_output.trim()
        )));
    }

    let wav = std::fs::read(&output_path);
    let _ = std::fs::remove_file(&output_path);
    Ok(wav?)
}

fn scratch_path(suffix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "clipdeck-{}-{nanos}-{suffix}",
        std::process::id()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(spec: hound::WavSpec, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn stereo16() -> hound::WavSpec {
        hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_decode_int16_stereo() {
        let bytes = wav_bytes(stereo16(), &[16384, -16384, 0, 32767]);
        let buffer = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(buffer.number_of_channels(), 2);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.5, 0.0]);
        assert_eq!(buffer.channel(1).unwrap()[0], -0.5);
    }

    #[test]
    fn test_corrupt_bytes_are_input_errors() {
        let err = decode_wav_bytes(b"RIFF\x00\x00\x00\x00WAVEjunk").unwrap_err();
        assert!(matches!(err, ClipdeckError::InvalidInput { .. }));
    }

    #[test]
    fn test_decoder_selection() {
        let bytes = wav_bytes(stereo16(), &[0, 0]);
        assert!(is_wav(&bytes));
        assert_eq!(decoder_for(&bytes).name(), "hound");
        assert_eq!(decoder_for(b"ID3\x04mp3 data").name(), "ffmpeg");
    }

    #[tokio::test]
    async fn test_async_decode() {
        let bytes = wav_bytes(stereo16(), &[1000, 1000, -1000, -1000]);
        let buffer = WavDecoder.decode(bytes).await.unwrap();
        assert_eq!(buffer.sample_rate(), 44_100);
        assert_eq!(buffer.channel(0), buffer.channel(1));
    }
}
