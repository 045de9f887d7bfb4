use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;

const UPLOADS_DIR: &str = "uploads";
const EXTRACTED_DIR: &str = "extracted";
const LOGS_DIR: &str = "logs";

/// On-disk layout for copied inputs, saved extractions and log files.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create `uploads/`, `extracted/` and `logs/` under `root`. Safe to call
    /// on an existing layout.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self { root: root.into() };
        for dir in [
            storage.uploads_dir(),
            storage.extracted_dir(),
            storage.logs_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join(EXTRACTED_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Copy an input file into `uploads/`, keeping its file name. An input
    /// that already is that upload is left untouched.
    pub async fn store_upload(&self, source: &Path) -> Result<PathBuf> {
        let dest = self.uploads_dir().join(file_name_of(source));
        if is_same_file(source, &dest).await {
            debug!(path = %dest.display(), "Input already in uploads");
            return Ok(dest);
        }
        tokio::fs::copy(source, &dest).await?;
        info!(path = %dest.display(), "Input copied to uploads");
        Ok(dest)
    }

    /// Write `text` to `extracted/<file name>.txt` as UTF-8.
    pub async fn save_extracted(&self, source: &Path, text: &str) -> Result<PathBuf> {
        let dest = self
            .extracted_dir()
            .join(format!("{}.txt", file_name_of(source)));
        tokio::fs::write(&dest, text).await?;
        info!(path = %dest.display(), characters = text.chars().count(), "Extracted text saved");
        Ok(dest)
    }
}

async fn is_same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::init(dir.path().join("storage")).unwrap();

        assert!(storage.uploads_dir().is_dir());
        assert!(storage.extracted_dir().is_dir());
        assert!(storage.logs_dir().is_dir());
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        Storage::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("logs").join("keep.log"), "x").unwrap();

        let storage = Storage::init(dir.path()).unwrap();
        assert!(storage.logs_dir().join("keep.log").exists());
    }

    #[tokio::test]
    async fn test_save_extracted_appends_txt_to_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::init(dir.path()).unwrap();

        let saved = storage
            .save_extracted(Path::new("/inbox/report.pdf"), "héllo")
            .await
            .unwrap();

        assert_eq!(saved, storage.extracted_dir().join("report.pdf.txt"));
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "héllo");
    }

    #[tokio::test]
    async fn test_store_upload_copies_input() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::init(dir.path().join("storage")).unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, "contents").unwrap();

        let copied = storage.store_upload(&input).await.unwrap();

        assert_eq!(copied, storage.uploads_dir().join("notes.txt"));
        assert_eq!(std::fs::read_to_string(copied).unwrap(), "contents");
        assert!(input.exists());
    }

    #[tokio::test]
    async fn test_store_upload_of_existing_upload_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::init(dir.path()).unwrap();
        let upload = storage.uploads_dir().join("minutes.docx");
        std::fs::write(&upload, "original bytes").unwrap();

        let stored = storage.store_upload(&upload).await.unwrap();

        assert_eq!(stored, upload);
        assert_eq!(std::fs::read_to_string(&upload).unwrap(), "original bytes");
    }

    #[tokio::test]
    async fn test_store_upload_through_relative_path_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::init(dir.path()).unwrap();
        std::fs::write(storage.uploads_dir().join("scan.png"), "pixels").unwrap();
        let roundabout = storage.extracted_dir().join("..").join("uploads").join("scan.png");

        storage.store_upload(&roundabout).await.unwrap();

        let contents = std::fs::read_to_string(storage.uploads_dir().join("scan.png")).unwrap();
        assert_eq!(contents, "pixels");
    }
}
