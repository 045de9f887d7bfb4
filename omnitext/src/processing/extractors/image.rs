use std::path::Path;

use crate::error::{OmnitextError, Result};
use crate::models::{DocumentFormat, ExtractedText};
use crate::ocr::normalize_image;
use crate::traits::TextRecognizer;

pub struct ImageExtractor;

impl ImageExtractor {
    /// Extract text from an image file using OCR
    ///
    /// # Arguments
    /// * `path` - PNG or JPEG file
    /// * `recognizer` - OCR engine
    ///
    /// # Returns
    /// The recognized text as a single fragment; a blank image yields no fragments
    pub async fn extract(path: &Path, recognizer: &dyn TextRecognizer) -> Result<ExtractedText> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            OmnitextError::Ocr(format!("Failed to read image {}: {e}", path.display()))
        })?;

        Self::extract_bytes(&bytes, recognizer).await
    }

    /// Extract text from in-memory image bytes
    pub async fn extract_bytes(
        bytes: &[u8],
        recognizer: &dyn TextRecognizer,
    ) -> Result<ExtractedText> {
        let processed = normalize_image(bytes)?;
        let text = recognizer.recognize(&processed).await?;

        let mut extracted = ExtractedText::for_format(DocumentFormat::Image);
        extracted.push(&text);
        Ok(extracted)
    }
}
