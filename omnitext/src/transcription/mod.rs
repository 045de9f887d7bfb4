//! Speech transcription and media tooling.
//!
//! - `TranscriptionProvider` runs a local Whisper model (via whisper-rs) and
//!   implements `SpeechTranscriber`. The `base` model is loaded on first use.
//! - `AudioPreprocessor` decodes MP3/WAV/MP4 audio with symphonia, down-mixes
//!   to mono and resamples to 16 kHz with rubato.
//! - `Ffmpeg` implements `MediaToolkit` over the `ffprobe`/`ffmpeg` binaries,
//!   used to cut video audio tracks into transcribable windows.

mod media;
mod preprocessing;
mod provider;
mod whisper;

pub use media::Ffmpeg;
pub use preprocessing::{AudioPreprocessor, TARGET_SAMPLE_RATE};
pub use provider::TranscriptionProvider;
pub use whisper::WhisperModel;
