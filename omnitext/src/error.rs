use thiserror::Error;

#[derive(Error, Debug)]
pub enum OmnitextError {
    #[error("Unsupported file type: .{0}")]
    UnsupportedFormat(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    #[error("Audio transcription failed: {0}")]
    Transcription(String),

    #[error("Video probe failed: {0}")]
    VideoProbe(String),

    #[error("Video transcription failed: {0}")]
    VideoTranscription(String),

    #[error("Text file reading failed: {0}")]
    TextRead(String),

    #[error("Word document extraction failed: {0}")]
    DocxExtraction(String),

    #[error("No readable text found in XML document")]
    NoReadableText,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OmnitextError {
    /// Stable name of the failure kind, used in logs and JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            OmnitextError::UnsupportedFormat(_) => "unsupported_format",
            OmnitextError::Ocr(_) => "ocr_failure",
            OmnitextError::PdfExtraction(_) => "pdf_extraction_failure",
            OmnitextError::Transcription(_) => "transcription_failure",
            OmnitextError::VideoProbe(_) => "video_probe_failure",
            OmnitextError::VideoTranscription(_) => "video_transcription_failure",
            OmnitextError::TextRead(_) => "text_read_failure",
            OmnitextError::DocxExtraction(_) => "docx_extraction_failure",
            OmnitextError::NoReadableText => "no_readable_text",
            OmnitextError::Io(_) => "io",
        }
    }

    /// Process exit code reported by the CLI for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            OmnitextError::UnsupportedFormat(_) => 2,
            OmnitextError::Ocr(_) => 10,
            OmnitextError::PdfExtraction(_) => 11,
            OmnitextError::Transcription(_) => 12,
            OmnitextError::VideoProbe(_) | OmnitextError::VideoTranscription(_) => 13,
            OmnitextError::TextRead(_) => 14,
            OmnitextError::DocxExtraction(_) | OmnitextError::NoReadableText => 15,
            OmnitextError::Io(_) => 74,
        }
    }
}

pub type Result<T> = std::result::Result<T, OmnitextError>;
