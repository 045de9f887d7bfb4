use std::sync::Arc;

use async_trait::async_trait;
use leptess::{LepTess, Variable};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{OmnitextError, Result};
use crate::traits::TextRecognizer;

/// Tesseract language pack used for every recognition.
pub const OCR_LANGUAGE: &str = "eng";

/// Page segmentation mode 6: assume a single uniform block of text.
pub const OCR_PAGE_SEGMENTATION_MODE: &str = "6";

#[derive(Clone)]
enum OcrBackend {
    Local { tesseract: Arc<Mutex<LepTess>> },
    Unavailable { reason: String },
}

/// Tesseract behind a shared lock. Clones share one engine.
#[derive(Clone)]
pub struct OcrProvider {
    backend: OcrBackend,
}

fn create_tesseract(tessdata_dir: Option<&str>) -> std::result::Result<LepTess, String> {
    let mut lt = LepTess::new(tessdata_dir, OCR_LANGUAGE).map_err(|e| e.to_string())?;
    lt.set_variable(Variable::TesseditPagesegMode, OCR_PAGE_SEGMENTATION_MODE)
        .map_err(|e| e.to_string())?;
    Ok(lt)
}

impl OcrProvider {
    /// Initializes Tesseract. A missing engine or language pack degrades to an
    /// unavailable provider whose every call fails with the init error.
    pub fn new(config: &OcrConfig) -> Self {
        let backend = match create_tesseract(config.tessdata_dir.as_deref()) {
            Ok(lt) => {
                info!(language = OCR_LANGUAGE, "Tesseract OCR initialized");
                OcrBackend::Local {
                    tesseract: Arc::new(Mutex::new(lt)),
                }
            }
            Err(e) => {
                let reason = format!(
                    "Tesseract not available: {e}. Ensure Tesseract is installed and accessible."
                );
                warn!("{}", reason);
                OcrBackend::Unavailable { reason }
            }
        };

        Self { backend }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: OcrBackend::Unavailable {
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub async fn ocr(&self, image_bytes: &[u8]) -> Result<String> {
        match &self.backend {
            OcrBackend::Local { tesseract } => {
                let bytes = image_bytes.to_vec();
                let tesseract = Arc::clone(tesseract);

                let text = tokio::task::spawn_blocking(move || {
                    let mut lt = tesseract.blocking_lock();
                    lt.set_image_from_mem(&bytes)
                        .map_err(|e| OmnitextError::Ocr(format!("Failed to set image: {e}")))?;
                    lt.get_utf8_text()
                        .map_err(|e| OmnitextError::Ocr(format!("Failed to extract text: {e}")))
                })
                .await
                .map_err(|e| OmnitextError::Ocr(format!("OCR task panicked: {e}")))??;

                Ok(text.trim().to_string())
            }
            OcrBackend::Unavailable { reason } => Err(OmnitextError::Ocr(reason.clone())),
        }
    }
}

#[async_trait]
impl TextRecognizer for OcrProvider {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String> {
        self.ocr(image_bytes).await
    }
}
