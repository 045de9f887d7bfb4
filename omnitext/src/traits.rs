//! Capability seams between the extraction core and the native engines.
//!
//! Every extractor reaches Tesseract, Whisper, poppler and ffmpeg through one
//! of these traits, so the fallback and chunking logic runs unchanged against
//! in-memory fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Optical character recognition over an encoded raster image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Returns the recognized text, trimmed. Blank images yield an empty string.
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String>;
}

/// Renders PDF pages to encoded PNG images.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Renders one page; `page_number` is 1-based.
    async fn render_page(&self, pdf: &Path, page_number: u32, dpi: u32) -> Result<Vec<u8>>;

    /// Renders every page, in page order.
    async fn render_all(&self, pdf: &Path, dpi: u32) -> Result<Vec<Vec<u8>>>;
}

/// Speech-to-text over a complete encoded audio file.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// `format_hint` is a file extension such as `"wav"` or `"mp3"`.
    async fn transcribe(&self, audio_bytes: &[u8], format_hint: Option<&str>) -> Result<String>;
}

/// External media inspection and transcoding.
#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Total duration of the media file in seconds.
    async fn probe_duration(&self, media: &Path) -> Result<f64>;

    /// Writes `[start_secs, start_secs + duration_secs)` of the audio track to
    /// `dest` as mono 16 kHz 16-bit PCM WAV.
    async fn extract_audio_window(
        &self,
        media: &Path,
        start_secs: f64,
        duration_secs: f64,
        dest: &Path,
    ) -> Result<()>;
}
