use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{OmnitextError, Result};
use crate::traits::PageRasterizer;

const OUTPUT_PREFIX: &str = "page";

/// Page rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: String,
    scratch_dir: Option<PathBuf>,
}

impl Pdftoppm {
    pub fn new(binary: impl Into<String>, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            scratch_dir,
        }
    }

    fn scratch(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("omnitext-render-");
        let dir = match &self.scratch_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    async fn run(&self, args: &[String], pdf: &Path, output_prefix: &Path) -> Result<()> {
        debug!(binary = %self.binary, ?args, pdf = %pdf.display(), "Rendering PDF pages");

        let output = Command::new(&self.binary)
            .args(args)
            .arg(pdf)
            .arg(output_prefix)
            .output()
            .await
            .map_err(|e| {
                OmnitextError::PdfExtraction(format!(
                    "Failed to execute {}: {e}. Ensure poppler-utils is installed.",
                    self.binary
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OmnitextError::PdfExtraction(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::new("pdftoppm", None)
    }
}

/// Parse the page number from a pdftoppm output name such as `page-07.png`.
fn page_number_of(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (_, number) = stem.rsplit_once('-')?;
    number.parse().ok()
}

#[async_trait]
impl PageRasterizer for Pdftoppm {
    async fn render_page(&self, pdf: &Path, page_number: u32, dpi: u32) -> Result<Vec<u8>> {
        let dir = self.scratch()?;
        let prefix = dir.path().join(OUTPUT_PREFIX);
        let page = page_number.to_string();
        let args = vec![
            "-png".to_string(),
            "-r".to_string(),
            dpi.to_string(),
            "-f".to_string(),
            page.clone(),
            "-l".to_string(),
            page,
            "-singlefile".to_string(),
        ];

        self.run(&args, pdf, &prefix).await?;

        let rendered = prefix.with_extension("png");
        let bytes = tokio::fs::read(&rendered).await.map_err(|e| {
            OmnitextError::PdfExtraction(format!(
                "Page {page_number} was not rendered ({}): {e}",
                rendered.display()
            ))
        })?;
        Ok(bytes)
    }

    async fn render_all(&self, pdf: &Path, dpi: u32) -> Result<Vec<Vec<u8>>> {
        let dir = self.scratch()?;
        let prefix = dir.path().join(OUTPUT_PREFIX);
        let args = vec!["-png".to_string(), "-r".to_string(), dpi.to_string()];

        self.run(&args, pdf, &prefix).await?;

        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(number) = page_number_of(&path) {
                pages.push((number, path));
            }
        }
        pages.sort_by_key(|(number, _)| *number);

        if pages.is_empty() {
            return Err(OmnitextError::PdfExtraction(format!(
                "{} produced no page images",
                self.binary
            )));
        }

        let mut images = Vec::with_capacity(pages.len());
        for (_, path) in pages {
            images.push(tokio::fs::read(&path).await?);
        }
        debug!(pages = images.len(), dpi, "Rendered PDF pages");

        Ok(images)
    }
}
