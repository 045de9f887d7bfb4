mod extractor;

pub mod extractors;

pub use extractor::{detect_format, ContentExtractor};
