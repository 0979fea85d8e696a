//! Decoded audio buffers.

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};

/// A decoded, immutable multi-channel PCM buffer.
///
/// Every channel holds the same number of `f32` samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer from planar channel data.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> ClipdeckResult<Self> {
        if sample_rate == 0 {
            return Err(ClipdeckError::invalid_input("Sample rate must be non-zero"));
        }
        let Some(first) = channels.first() else {
            return Err(ClipdeckError::invalid_input("Audio has no channels"));
        };
        let len = first.len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(ClipdeckError::invalid_input(
                "Audio channels have different lengths",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Build a buffer from interleaved frames (`L R L R ...` for stereo).
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: u16,
        samples: &[f32],
    ) -> ClipdeckResult<Self> {
        let count = channel_count as usize;
        if count == 0 {
            return Err(ClipdeckError::invalid_input("Audio has no channels"));
        }
        if samples.len() % count != 0 {
            return Err(ClipdeckError::invalid_input(format!(
                "Interleaved sample count {} is not a multiple of {count} channels",
                samples.len()
            )));
        }
        let frames = samples.len() / count;
        let mut channels = vec![Vec::with_capacity(frames); count];
        for frame in samples.chunks_exact(count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Left and right channels, or an input error for anything but stereo.
    pub fn stereo_pair(&self) -> ClipdeckResult<(&[f32], &[f32])> {
        match self.channels.as_slice() {
            [left, right] => Ok((left, right)),
            other => Err(ClipdeckError::invalid_input(format!(
                "Vocal removal needs a stereo source; this file has {} channel(s)",
                other.len()
            ))),
        }
    }
}

/// Result of phase cancellation: two identical output channels.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedBuffer {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl MixedBuffer {
    /// Number of output channels; both carry the same samples.
    pub const CHANNELS: u16 = 2;

    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples of either output channel.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_ragged_channels() {
        let err = AudioBuffer::new(44_100, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(matches!(err, ClipdeckError::InvalidInput { .. }));
    }

    #[test]
    fn test_from_interleaved_splits_channels() {
        let buffer = AudioBuffer::from_interleaved(8_000, 2, &[0.1, -0.1, 0.2, -0.2]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.1, -0.2]);
    }

    #[test]
    fn test_stereo_pair_rejects_mono() {
        let mono = AudioBuffer::new(44_100, vec![vec![0.5; 10]]).unwrap();
        assert!(mono.stereo_pair().is_err());

        let surround = AudioBuffer::new(44_100, vec![vec![0.0; 10]; 6]).unwrap();
        assert!(surround.stereo_pair().is_err());
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::new(48_000, vec![vec![0.0; 96_000]; 2]).unwrap();
        assert!((buffer.duration_secs() - 2.0).abs() < 1e-12);
    }
}
