//! Center-channel removal by phase cancellation.
//!
//! Subtracting the right channel from the left cancels anything mixed
//! identically into both, which for most pop mixes includes the lead vocal.
//! It is not source separation: centered instruments (kick, bass, snare)
//! disappear with the vocal, and vocals recorded off-center or with stereo
//! effects survive.

use clipdeck_common::error::ClipdeckResult;
use clipdeck_media_model::audio::{AudioBuffer, MixedBuffer};

/// Stateless `left - right` mixer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseCancellationMixer;

impl PhaseCancellationMixer {
    /// `out[i] = clamp(left[i] - right[i], -1, 1)`, written to both output channels.
    ///
    /// Only stereo input is accepted; mono and multi-channel buffers are
    /// rejected with an input error rather than guessed at.
    pub fn mix(buffer: &AudioBuffer) -> ClipdeckResult<MixedBuffer> {
        let (left, right) = buffer.stereo_pair()?;
        let samples = left
            .iter()
            .zip(right)
            .map(|(l, r)| (l - r).clamp(-1.0, 1.0))
            .collect();
        Ok(MixedBuffer::new(buffer.sample_rate(), samples))
    }
}
