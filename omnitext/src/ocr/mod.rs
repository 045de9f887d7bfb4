//! OCR (Optical Character Recognition) Module
//!
//! Image text extraction for the image extractor and the OCR-backed PDF
//! stages.
//!
//! # Architecture
//!
//! - `OcrProvider` wraps a local Tesseract engine (via leptess) and implements
//!   `TextRecognizer`. When Tesseract cannot be initialized the provider stays
//!   constructible and every call fails with the init error.
//! - `Pdftoppm` implements `PageRasterizer` on top of poppler's `pdftoppm`.
//! - `normalize_image` decodes arbitrary raster input into a PNG the engine
//!   accepts.
//!
//! Language (`eng`) and page segmentation mode (6, uniform block of text) are
//! fixed.
//!
//! # Usage
//!
//! ```rust,ignore
//! let ocr = OcrProvider::new(&config.ocr);
//! let text = ocr.ocr(&normalize_image(&bytes)?).await?;
//! ```

mod preprocessing;
mod provider;
mod rasterizer;

pub use preprocessing::normalize_image;
pub use provider::{OcrProvider, OCR_LANGUAGE, OCR_PAGE_SEGMENTATION_MODE};
pub use rasterizer::Pdftoppm;
