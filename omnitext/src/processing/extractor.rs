use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::config::Config;
use crate::error::{OmnitextError, Result};
use crate::models::{DocumentFormat, ExtractedText, ExtractionRequest};
use crate::ocr::{OcrProvider, Pdftoppm};
use crate::processing::extractors::{
    AudioExtractor, DocxExtractor, ImageExtractor, PdfExtractor, TextExtractor, VideoExtractor,
};
use crate::traits::{MediaToolkit, PageRasterizer, SpeechTranscriber, TextRecognizer};
use crate::transcription::{Ffmpeg, TranscriptionProvider};

/// Map a path's extension (case-insensitive) to its document format.
///
/// A missing extension is reported as `UnsupportedFormat("")`.
pub fn detect_format(path: &Path) -> Result<DocumentFormat> {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();

    DocumentFormat::from_extension(&ext).ok_or(OmnitextError::UnsupportedFormat(ext))
}

/// Single entry point: routes a file to its extractor.
#[derive(Clone)]
pub struct ContentExtractor {
    recognizer: Arc<dyn TextRecognizer>,
    rasterizer: Arc<dyn PageRasterizer>,
    transcriber: Arc<dyn SpeechTranscriber>,
    media: Arc<dyn MediaToolkit>,
    scratch_dir: Option<PathBuf>,
}

impl ContentExtractor {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        rasterizer: Arc<dyn PageRasterizer>,
        transcriber: Arc<dyn SpeechTranscriber>,
        media: Arc<dyn MediaToolkit>,
    ) -> Self {
        Self {
            recognizer,
            rasterizer,
            transcriber,
            media,
            scratch_dir: None,
        }
    }

    /// Wire the native engines described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let scratch_dir = config.media.scratch_dir.clone();

        Self::new(
            Arc::new(OcrProvider::new(&config.ocr)),
            Arc::new(Pdftoppm::new(
                &config.ocr.pdftoppm_bin,
                scratch_dir.clone(),
            )),
            Arc::new(TranscriptionProvider::new(&config.transcription)),
            Arc::new(Ffmpeg::from_config(&config.media)),
        )
        .with_scratch_dir(scratch_dir)
    }

    /// Directory for temporary audio chunks; the system temp dir when `None`.
    pub fn with_scratch_dir(mut self, scratch_dir: Option<PathBuf>) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }

    /// Extract the text of `path`, choosing the extractor from its extension.
    pub async fn extract(&self, path: &Path) -> Result<String> {
        let format = detect_format(path)?;
        let request = ExtractionRequest::new(path, format);
        Ok(self.extract_request(&request).await?.into_text())
    }

    pub async fn extract_request(&self, request: &ExtractionRequest) -> Result<ExtractedText> {
        let path = request.path();
        let format = request.format();
        let started = Instant::now();

        info!(path = %path.display(), %format, "Extracting text");

        let result = match format {
            DocumentFormat::Image => ImageExtractor::extract(path, self.recognizer.as_ref()).await,
            DocumentFormat::Pdf => {
                PdfExtractor::extract(path, self.recognizer.as_ref(), self.rasterizer.as_ref())
                    .await
            }
            DocumentFormat::Audio => {
                AudioExtractor::extract(path, self.transcriber.as_ref()).await
            }
            DocumentFormat::Video => {
                VideoExtractor::extract(
                    path,
                    self.media.as_ref(),
                    self.transcriber.as_ref(),
                    self.scratch_dir.as_deref(),
                )
                .await
            }
            DocumentFormat::Text => TextExtractor::extract(path).await,
            DocumentFormat::Docx => DocxExtractor::extract(path).await,
        };

        match &result {
            Ok(text) => info!(
                path = %path.display(),
                %format,
                fragments = text.len(),
                characters = text.fragments().iter().map(|f| f.chars().count()).sum::<usize>(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Extraction completed"
            ),
            Err(e) => error!(
                path = %path.display(),
                %format,
                kind = e.kind(),
                error = %e,
                "Extraction failed"
            ),
        }

        result
    }
}
