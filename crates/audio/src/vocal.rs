//! Vocal-removal pipeline: decode, phase-cancel, encode.

use std::path::Path;

use clipdeck_common::error::{ClipdeckError, ClipdeckResult};
use clipdeck_media_model::asset::{derived_file_name, ContainerKind, EncodedAsset};

use crate::decode::AudioDecoder;
use crate::phase_cancel::PhaseCancellationMixer;
use crate::wav::encode_wav;

/// Produce an instrumental WAV from the raw bytes of `source`.
///
/// `source` only names the output (`<stem>-instrumental.wav`). Every
/// failure comes back as a [`ClipdeckError`]; no partial asset is returned.
pub async fn remove_vocals(
    source: &Path,
    bytes: Vec<u8>,
    decoder: &dyn AudioDecoder,
) -> ClipdeckResult<EncodedAsset> {
    tracing::info!(
        source = %source.display(),
        bytes = bytes.len(),
        decoder = decoder.name(),
        "Starting vocal removal"
    );

    if bytes.is_empty() {
        return Err(ClipdeckError::invalid_input("Audio file is empty"));
    }
    if !decoder.is_available() {
        return Err(ClipdeckError::capability(format!(
            "No audio decoder for this file ({} is not installed)",
            decoder.name()
        )));
    }

    let buffer = decoder.decode(bytes).await?;
    tracing::info!(
        channels = buffer.number_of_channels(),
        sample_rate = buffer.sample_rate(),
        duration_secs = buffer.duration_secs(),
        "Audio decoded"
    );

    let mixed = PhaseCancellationMixer::mix(&buffer)?;
    let wav = encode_wav(&mixed)?;

    let file_name = derived_file_name(source, "instrumental", ContainerKind::Wav);
    tracing::info!(file_name = %file_name, bytes = wav.len(), "Vocal removal complete");
    Ok(EncodedAsset::new(wav, ContainerKind::Wav, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clipdeck_media_model::audio::AudioBuffer;

    struct FixedDecoder {
        available: bool,
        channels: usize,
    }

    #[async_trait]
    impl AudioDecoder for FixedDecoder {
        fn is_available(&self) -> bool {
            self.available
        }

        fn name(&self) -> &str {
            "fixed"
        }

        async fn decode(&self, _bytes: Vec<u8>) -> ClipdeckResult<AudioBuffer> {
            AudioBuffer::new(8_000, vec![vec![0.25; 16]; self.channels])
        }
    }

    #[tokio::test]
    async fn test_missing_decoder_is_capability_error() {
        let decoder = FixedDecoder {
            available: false,
            channels: 2,
        };
        let err = remove_vocals(Path::new("a.mp3"), vec![1], &decoder)
            .await
            .unwrap_err();
        assert!(matches!(err, ClipdeckError::Capability { .. }));
    }

    #[tokio::test]
    async fn test_mono_source_is_rejected_before_encoding() {
        let decoder = FixedDecoder {
            available: true,
            channels: 1,
        };
        let err = remove_vocals(Path::new("a.wav"), vec![1], &decoder)
            .await
            .unwrap_err();
        assert!(matches!(err, ClipdeckError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_asset_named_after_source() {
        let decoder = FixedDecoder {
            available: true,
            channels: 2,
        };
        let asset = remove_vocals(Path::new("/tmp/track 01.flac"), vec![1], &decoder)
            .await
            .unwrap();
        assert_eq!(asset.file_name(), "track 01-instrumental.wav");
        assert_eq!(asset.mime_type(), "audio/wav");
        assert_eq!(asset.len(), 44 + 16 * 4);
    }
}
