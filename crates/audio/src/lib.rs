//! Clipdeck Audio
//!
//! Sample-domain processing that runs without any model call:
//! - **Phase cancellation:** removes content panned identically to both channels
//! - **WAV encoding:** byte-exact RIFF/WAVE 16-bit PCM container writer
//! - **Decoding:** WAV bytes via `hound`, everything else through `ffmpeg`
//!
//! [`remove_vocals`] chains the three into one pipeline.

pub mod decode;
pub mod phase_cancel;
pub mod vocal;
pub mod wav;

pub use decode::{decoder_for, AudioDecoder, FfmpegAudioDecoder, WavDecoder};
pub use phase_cancel::PhaseCancellationMixer;
pub use vocal::remove_vocals;
pub use wav::{encode_wav, PcmFrames};
