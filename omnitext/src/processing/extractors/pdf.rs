use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{OmnitextError, Result};
use crate::models::{DocumentFormat, ExtractedText};
use crate::traits::{PageRasterizer, TextRecognizer};

/// Resolution for rendering single textless pages in the render stage.
pub const PAGE_RENDER_DPI: u32 = 72;

/// Resolution for the full-document OCR stage.
pub const FULL_OCR_DPI: u32 = 300;

/// A PDF loaded once and shared by every stage.
#[derive(Debug, Clone)]
pub struct PdfSource {
    path: PathBuf,
    bytes: Arc<Vec<u8>>,
}

impl PdfSource {
    pub async fn open(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            OmnitextError::PdfExtraction(format!("Failed to read PDF {}: {e}", path.display()))
        })?;
        Ok(Self::from_bytes(path, bytes))
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        Self {
            path: path.to_path_buf(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One strategy for pulling page text out of a PDF.
///
/// A stage returns page fragments in page order. Returning no fragments or an
/// error hands the document to the next stage.
#[async_trait]
pub trait PdfStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, pdf: &PdfSource) -> Result<Vec<String>>;
}

/// Run a PDF parser on the blocking pool. A parser panic becomes an error for
/// the calling stage instead of taking the process down.
async fn parse_blocking<T, F>(engine: &'static str, parse: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| OmnitextError::PdfExtraction(format!("{engine} panicked: {e}")))?
}

/// Per-page text through `pdf-extract`.
pub struct StructuredTextStage;

#[async_trait]
impl PdfStage for StructuredTextStage {
    fn name(&self) -> &'static str {
        "structured-text"
    }

    async fn run(&self, pdf: &PdfSource) -> Result<Vec<String>> {
        let bytes = Arc::clone(&pdf.bytes);
        parse_blocking("pdf-extract", move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
                .map_err(|e| OmnitextError::PdfExtraction(format!("pdf-extract failed: {e}")))
        })
        .await
    }
}

/// Embedded page text through `lopdf`; pages without text are rendered and OCR'd.
pub struct RenderStage<'a> {
    pub recognizer: &'a dyn TextRecognizer,
    pub rasterizer: &'a dyn PageRasterizer,
}

/// Embedded text of every page, keyed by 1-based page number.
fn lopdf_page_texts(bytes: &[u8]) -> Result<Vec<(u32, String)>> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| OmnitextError::PdfExtraction(format!("lopdf failed to load: {e}")))?;

    let pages = document
        .get_pages()
        .into_keys()
        .map(|number| {
            let text = document.extract_text(&[number]).unwrap_or_else(|e| {
                debug!(page = number, error = %e, "No embedded text on page");
                String::new()
            });
            (number, text)
        })
        .collect();

    Ok(pages)
}

#[async_trait]
impl PdfStage for RenderStage<'_> {
    fn name(&self) -> &'static str {
        "render"
    }

    async fn run(&self, pdf: &PdfSource) -> Result<Vec<String>> {
        let bytes = Arc::clone(&pdf.bytes);
        let pages = parse_blocking("lopdf", move || lopdf_page_texts(&bytes)).await?;

        let mut fragments = Vec::with_capacity(pages.len());
        for (number, text) in pages {
            if !text.trim().is_empty() {
                fragments.push(text);
                continue;
            }

            let rendered = match self
                .rasterizer
                .render_page(pdf.path(), number, PAGE_RENDER_DPI)
                .await
            {
                Ok(image) => image,
                Err(e) => {
                    warn!(page = number, error = %e, "Failed to render PDF page, skipping");
                    continue;
                }
            };

            match self.recognizer.recognize(&rendered).await {
                Ok(text) => fragments.push(text),
                Err(e) => warn!(page = number, error = %e, "Failed to OCR PDF page, skipping"),
            }
        }

        Ok(fragments)
    }
}

/// Every page rendered at high resolution and OCR'd, ignoring embedded text.
pub struct FullOcrStage<'a> {
    pub recognizer: &'a dyn TextRecognizer,
    pub rasterizer: &'a dyn PageRasterizer,
}

#[async_trait]
impl PdfStage for FullOcrStage<'_> {
    fn name(&self) -> &'static str {
        "full-ocr"
    }

    async fn run(&self, pdf: &PdfSource) -> Result<Vec<String>> {
        let images = self.rasterizer.render_all(pdf.path(), FULL_OCR_DPI).await?;

        let mut fragments = Vec::with_capacity(images.len());
        for image in &images {
            fragments.push(self.recognizer.recognize(image).await?);
        }
        Ok(fragments)
    }
}

/// Run stages in priority order and keep the first that yields any text.
pub async fn run_stages(stages: &[&dyn PdfStage], pdf: &PdfSource) -> Result<ExtractedText> {
    let mut causes = Vec::with_capacity(stages.len());

    for stage in stages {
        match stage.run(pdf).await {
            Ok(pages) => {
                let text =
                    ExtractedText::from_fragments(DocumentFormat::Pdf.fragment_separator(), pages);
                if !text.is_empty() {
                    info!(
                        stage = stage.name(),
                        pages = text.len(),
                        path = %pdf.path().display(),
                        "PDF text extracted"
                    );
                    return Ok(text);
                }
                debug!(stage = stage.name(), "PDF stage produced no text");
                causes.push(format!("{}: no text", stage.name()));
            }
            Err(e) => {
                warn!(stage = stage.name(), error = %e, "PDF stage failed");
                causes.push(format!("{}: {e}", stage.name()));
            }
        }
    }

    Err(OmnitextError::PdfExtraction(format!(
        "No text could be extracted from {}; the PDF is likely encrypted, corrupted, or genuinely textless ({})",
        pdf.path().display(),
        causes.join("; ")
    )))
}

pub struct PdfExtractor;

impl PdfExtractor {
    /// Extract text from a PDF, falling back from embedded text to OCR
    ///
    /// # Arguments
    /// * `path` - PDF file
    /// * `recognizer` - OCR engine for rendered pages
    /// * `rasterizer` - Page renderer
    pub async fn extract(
        path: &Path,
        recognizer: &dyn TextRecognizer,
        rasterizer: &dyn PageRasterizer,
    ) -> Result<ExtractedText> {
        let pdf = PdfSource::open(path).await?;

        let structured = StructuredTextStage;
        let render = RenderStage {
            recognizer,
            rasterizer,
        };
        let full_ocr = FullOcrStage {
            recognizer,
            rasterizer,
        };

        run_stages(&[&structured, &render, &full_ocr], &pdf).await
    }
}
