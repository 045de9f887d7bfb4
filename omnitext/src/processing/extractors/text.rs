use std::path::Path;

use crate::error::{OmnitextError, Result};
use crate::models::{DocumentFormat, ExtractedText};

pub struct TextExtractor;

impl TextExtractor {
    /// Read a plain-text file, decoding UTF-8 with a Latin-1 fallback
    pub async fn extract(path: &Path) -> Result<ExtractedText> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            OmnitextError::TextRead(format!("Failed to read {}: {e}", path.display()))
        })?;

        let mut extracted = ExtractedText::for_format(DocumentFormat::Text);
        extracted.push(&decode_text(bytes));
        Ok(extracted)
    }
}

/// UTF-8 when valid, otherwise Latin-1 (every byte maps to U+0000..=U+00FF).
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().into_iter().map(char::from).collect(),
    }
}
