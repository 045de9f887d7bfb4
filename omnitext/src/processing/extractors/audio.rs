use std::path::Path;

use crate::error::{OmnitextError, Result};
use crate::models::{DocumentFormat, ExtractedText};
use crate::traits::SpeechTranscriber;

pub struct AudioExtractor;

impl AudioExtractor {
    /// Transcribe an audio file in one pass
    ///
    /// # Arguments
    /// * `path` - MP3 or WAV file
    /// * `transcriber` - Speech-to-text engine
    pub async fn extract(path: &Path, transcriber: &dyn SpeechTranscriber) -> Result<ExtractedText> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            OmnitextError::Transcription(format!("Failed to read audio {}: {e}", path.display()))
        })?;

        if bytes.is_empty() {
            return Err(OmnitextError::Transcription("Empty audio data".to_string()));
        }

        let hint = path.extension().and_then(|ext| ext.to_str());
        let text = transcriber.transcribe(&bytes, hint).await?;

        tracing::debug!(words = text.split_whitespace().count(), "Audio transcribed");

        let mut extracted = ExtractedText::for_format(DocumentFormat::Audio);
        extracted.push(&text);
        Ok(extracted)
    }
}
