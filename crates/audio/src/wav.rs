//! RIFF/WAVE 16-bit PCM container writer.
//!
//! The 44-byte header is described as a list of [`HeaderField`]s (name and
//! value; the value's type fixes its width) and serialized in order, so
//! field positions follow from the layout instead of hand-tracked offsets.

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::audio::{AudioBuffer, MixedBuffer};

/// Header length of a canonical PCM WAV file.
pub const WAV_HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Planar PCM that can be interleaved into a WAV payload.
pub trait PcmFrames {
    fn channel_count(&self) -> u16;
    fn sample_rate(&self) -> u32;
    /// Samples per channel.
    fn frame_count(&self) -> usize;
    fn sample(&self, channel: usize, frame: usize) -> f32;
}

impl PcmFrames for AudioBuffer {
    fn channel_count(&self) -> u16 {
        self.number_of_channels() as u16
    }

    fn sample_rate(&self) -> u32 {
        AudioBuffer::sample_rate(self)
    }

    fn frame_count(&self) -> usize {
        self.len()
    }

    fn sample(&self, channel: usize, frame: usize) -> f32 {
        self.channel(channel).map(|c| c[frame]).unwrap_or(0.0)
    }
}

impl PcmFrames for MixedBuffer {
    fn channel_count(&self) -> u16 {
        MixedBuffer::CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        MixedBuffer::sample_rate(self)
    }

    fn frame_count(&self) -> usize {
        self.len()
    }

    fn sample(&self, _channel: usize, frame: usize) -> f32 {
        self.samples()[frame]
    }
}

/// Value of one header field. The variant determines the encoded width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Four ASCII bytes, written as-is.
    Tag([u8; 4]),
    /// Little-endian 16-bit integer.
    U16(u16),
    /// Little-endian 32-bit integer.
    U32(u32),
}

impl FieldValue {
    pub fn width(&self) -> usize {
        match self {
            Self::Tag(_) => 4,
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Tag(tag) => out.extend_from_slice(tag),
            Self::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }
}

/// A named header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    pub name: &'static str,
    pub value: FieldValue,
}

const fn field(name: &'static str, value: FieldValue) -> HeaderField {
    HeaderField { name, value }
}

/// Header layout for `channels` x 16-bit PCM with a `data_len`-byte payload.
pub fn header_layout(channels: u16, sample_rate: u32, data_len: u32) -> [HeaderField; 13] {
    let block_align = channels * BYTES_PER_SAMPLE;
    let byte_rate = sample_rate * block_align as u32;
    // RIFF size covers everything after the 8-byte RIFF preamble.
    let riff_len = (WAV_HEADER_LEN as u32 - 8) + data_len;

    [
        field("riff_id", FieldValue::Tag(*b"RIFF")),
        field("riff_size", FieldValue::U32(riff_len)),
        field("wave_id", FieldValue::Tag(*b"WAVE")),
        field("fmt_id", FieldValue::Tag(*b"fmt ")),
        field("fmt_size", FieldValue::U32(FMT_CHUNK_LEN)),
        field("audio_format", FieldValue::U16(FORMAT_PCM)),
        field("channels", FieldValue::U16(channels)),
        field("sample_rate", FieldValue::U32(sample_rate)),
        field("byte_rate", FieldValue::U32(byte_rate)),
        field("block_align", FieldValue::U16(block_align)),
        field("bits_per_sample", FieldValue::U16(BITS_PER_SAMPLE)),
        field("data_id", FieldValue::Tag(*b"data")),
        field("data_size", FieldValue::U32(data_len)),
    ]
}

/// Serialize a layout in declaration order.
pub fn write_layout(fields: &[HeaderField], out: &mut Vec<u8>) {
    for f in fields {
        f.value.write(out);
    }
}

/// Total encoded width of a layout.
pub fn layout_len(fields: &[HeaderField]) -> usize {
    fields.iter().map(|f| f.value.width()).sum()
}

/// Convert a float sample to 16-bit PCM.
///
/// Negative values scale by 32768, non-negative by 32767, then clamp.
pub fn float_to_pcm16(sample: f32) -> i16 {
    let scaled = if sample < 0.0 {
        sample * 32768.0
    } else {
        sample * 32767.0
    };
    scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encode PCM frames into a complete WAV file.
pub fn encode_wav<P: PcmFrames + ?Sized>(pcm: &P) -> ClipdeckResult<Vec<u8>> {
    let channels = pcm.channel_count();
    if channels == 0 {
        return Err(ClipdeckError::invalid_input("Cannot encode audio with no channels"));
    }
    let frames = pcm.frame_count();
    let data_len = frames
        .checked_mul(channels as usize * BYTES_PER_SAMPLE as usize)
        .and_then(|len| u32::try_from(len).ok())
        .filter(|len| len.checked_add(WAV_HEADER_LEN as u32 - 8).is_some())
        .ok_or_else(|| {
            ClipdeckError::invalid_input("Audio is too long for a 32-bit WAV container")
        })?;

    let layout = header_layout(channels, pcm.sample_rate(), data_len);
    debug_assert_eq!(layout_len(&layout), WAV_HEADER_LEN);

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
    write_layout(&layout, &mut out);
    for frame in 0..frames {
        for channel in 0..channels as usize {
            out.extend_from_slice(&float_to_pcm16(pcm.sample(channel, frame)).to_le_bytes());
        }
    }

    tracing::debug!(
        channels,
        sample_rate = pcm.sample_rate(),
        frames,
        bytes = out.len(),
        "Encoded WAV"
    );
    Ok(out)
}
