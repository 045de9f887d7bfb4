use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::preprocessing::AudioPreprocessor;
use super::whisper::WhisperModel;
use crate::config::TranscriptionConfig;
use crate::error::{OmnitextError, Result};
use crate::traits::SpeechTranscriber;

#[derive(Clone)]
enum TranscriptionBackend {
    /// The model is loaded on first use and shared by every clone.
    Local {
        model_path: PathBuf,
        whisper: Arc<OnceCell<WhisperModel>>,
    },
    Unavailable {
        reason: String,
    },
}

/// Local Whisper transcription. Clones share the lazily loaded model.
#[derive(Clone)]
pub struct TranscriptionProvider {
    backend: TranscriptionBackend,
}

impl TranscriptionProvider {
    pub fn new(config: &TranscriptionConfig) -> Self {
        let model_path = config.model_path();
        info!(model_path = %model_path.display(), "Local Whisper backend configured");

        Self {
            backend: TranscriptionBackend::Local {
                model_path,
                whisper: Arc::new(OnceCell::new()),
            },
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            backend: TranscriptionBackend::Unavailable {
                reason: reason.to_string(),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, TranscriptionBackend::Unavailable { .. })
    }

    /// Returns the loaded model, loading it on the first call. A failed load is
    /// not cached.
    async fn whisper<'a>(
        model_path: &Path,
        whisper: &'a OnceCell<WhisperModel>,
    ) -> Result<&'a WhisperModel> {
        whisper
            .get_or_try_init(|| async {
                let path = model_path.to_path_buf();
                tokio::task::spawn_blocking(move || WhisperModel::load(&path))
                    .await
                    .map_err(|e| {
                        OmnitextError::Transcription(format!("Model load task panicked: {e}"))
                    })?
            })
            .await
    }

    pub async fn transcribe(&self, audio_bytes: &[u8], format_hint: Option<&str>) -> Result<String> {
        match &self.backend {
            TranscriptionBackend::Local {
                model_path,
                whisper,
            } => {
                let whisper = Self::whisper(model_path, whisper).await?;

                let bytes = audio_bytes.to_vec();
                let hint = format_hint.map(str::to_string);
                let pcm_samples = tokio::task::spawn_blocking(move || {
                    AudioPreprocessor::prepare_for_whisper(&bytes, hint.as_deref())
                })
                .await
                .map_err(|e| {
                    OmnitextError::Transcription(format!("Audio decode task panicked: {e}"))
                })??;

                debug!(samples = pcm_samples.len(), "Audio prepared for Whisper");
                whisper.transcribe(&pcm_samples).await
            }
            TranscriptionBackend::Unavailable { reason } => {
                Err(OmnitextError::Transcription(reason.clone()))
            }
        }
    }
}

#[async_trait]
impl SpeechTranscriber for TranscriptionProvider {
    async fn transcribe(&self, audio_bytes: &[u8], format_hint: Option<&str>) -> Result<String> {
        TranscriptionProvider::transcribe(self, audio_bytes, format_hint).await
    }
}
