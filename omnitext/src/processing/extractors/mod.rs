pub mod audio;
pub mod docx;
pub mod image;
pub mod pdf;
pub mod text;
pub mod video;

pub use audio::AudioExtractor;
pub use docx::DocxExtractor;
pub use image::ImageExtractor;
pub use pdf::{PdfExtractor, PdfStage, FULL_OCR_DPI, PAGE_RENDER_DPI};
pub use text::TextExtractor;
pub use video::{plan_windows, ChunkWindow, VideoExtractor, VIDEO_CHUNK_SECS};
