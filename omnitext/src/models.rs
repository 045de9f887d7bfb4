use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extraction strategy selected from a file's extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Image,
    Pdf,
    Audio,
    Video,
    Text,
    Docx,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 6] = [
        DocumentFormat::Image,
        DocumentFormat::Pdf,
        DocumentFormat::Audio,
        DocumentFormat::Video,
        DocumentFormat::Text,
        DocumentFormat::Docx,
    ];

    /// Lower-case extensions (without the dot) dispatched to this format.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Image => &["png", "jpg", "jpeg"],
            Self::Pdf => &["pdf"],
            Self::Audio => &["mp3", "wav"],
            Self::Video => &["mp4"],
            Self::Text => &["txt"],
            Self::Docx => &["docx"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let lower = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&lower.as_str()))
    }

    /// Separator placed between fragments in the final output.
    pub fn fragment_separator(&self) -> &'static str {
        match self {
            Self::Video => " ",
            _ => "\n",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Pdf => write!(f, "pdf"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::Text => write!(f, "text"),
            Self::Docx => write!(f, "docx"),
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "text" => Ok(Self::Text),
            "docx" => Ok(Self::Docx),
            _ => Err(format!("Unknown document format: {s}")),
        }
    }
}

/// A single extraction call: where to read from and which strategy to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    path: PathBuf,
    format: DocumentFormat,
}

impl ExtractionRequest {
    pub fn new(path: impl Into<PathBuf>, format: DocumentFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// Ordered, trimmed, non-empty text fragments.
///
/// One fragment per structural unit: a PDF page, a paragraph, a table cell,
/// a header or footer line, an audio or video chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    fragments: Vec<String>,
    separator: &'static str,
}

impl ExtractedText {
    pub fn new(separator: &'static str) -> Self {
        Self {
            fragments: Vec::new(),
            separator,
        }
    }

    pub fn for_format(format: DocumentFormat) -> Self {
        Self::new(format.fragment_separator())
    }

    pub fn from_fragments<I, S>(separator: &'static str, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = Self::new(separator);
        for fragment in fragments {
            text.push(fragment.as_ref());
        }
        text
    }

    /// Appends the trimmed fragment; blank input is ignored.
    pub fn push(&mut self, fragment: &str) -> bool {
        let trimmed = fragment.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.fragments.push(trimmed.to_string());
        true
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn separator(&self) -> &'static str {
        self.separator
    }

    pub fn into_text(self) -> String {
        self.fragments.join(self.separator)
    }
}

impl std::fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.fragments.join(self.separator))
    }
}
