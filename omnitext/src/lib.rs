//! Plain-text extraction from images, PDFs, audio, video, text files and
//! Word documents.
//!
//! ```rust,ignore
//! let extractor = ContentExtractor::from_config(&Config::from_env());
//! let text = extractor.extract(Path::new("minutes.docx")).await?;
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod processing;
pub mod storage;
pub mod traits;
pub mod transcription;

pub use config::Config;
pub use error::{OmnitextError, Result};
pub use models::{DocumentFormat, ExtractedText, ExtractionRequest};
pub use processing::{detect_format, ContentExtractor};
pub use storage::Storage;
