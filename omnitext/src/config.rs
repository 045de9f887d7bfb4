use std::env;
use std::path::PathBuf;

/// Whisper model tier used for every transcription.
pub const WHISPER_MODEL_TIER: &str = "base";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var(var)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
    pub transcription: TranscriptionConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub log_to_file: bool,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub tessdata_dir: Option<String>,
    pub pdftoppm_bin: String,
}

#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub model_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    /// Directory for temporary chunk files and page renders. `None` means the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl TranscriptionConfig {
    /// Path of the ggml model file for the fixed model tier.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(format!("ggml-{WHISPER_MODEL_TIER}.bin"))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("storage"),
            log_to_file: true,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tessdata_dir: None,
            pdftoppm_bin: "pdftoppm".to_string(),
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            scratch_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Self {
            storage: StorageConfig {
                root: env_path("OMNITEXT_STORAGE_DIR").unwrap_or(defaults.storage.root),
                log_to_file: parse_env_or("OMNITEXT_LOG_TO_FILE", defaults.storage.log_to_file),
            },
            ocr: OcrConfig {
                tessdata_dir: env::var("OMNITEXT_TESSDATA_DIR").ok(),
                pdftoppm_bin: env::var("OMNITEXT_PDFTOPPM_BIN")
                    .unwrap_or(defaults.ocr.pdftoppm_bin),
            },
            transcription: TranscriptionConfig {
                model_dir: env_path("OMNITEXT_WHISPER_MODEL_DIR")
                    .unwrap_or(defaults.transcription.model_dir),
            },
            media: MediaConfig {
                ffmpeg_bin: env::var("OMNITEXT_FFMPEG_BIN").unwrap_or(defaults.media.ffmpeg_bin),
                ffprobe_bin: env::var("OMNITEXT_FFPROBE_BIN")
                    .unwrap_or(defaults.media.ffprobe_bin),
                scratch_dir: env_path("OMNITEXT_SCRATCH_DIR"),
            },
        }
    }
}
