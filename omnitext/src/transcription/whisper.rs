use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::preprocessing::TARGET_SAMPLE_RATE;
use crate::error::{OmnitextError, Result};

/// A loaded ggml Whisper model. Clones share the same weights.
#[derive(Clone)]
pub struct WhisperModel {
    context: Arc<Mutex<WhisperContext>>,
    model_path: Arc<PathBuf>,
}

impl WhisperModel {
    /// Read the model at `model_path`. Blocks for as long as the weights take
    /// to load, so async callers go through `spawn_blocking`.
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.is_file() {
            return Err(OmnitextError::Transcription(format!(
                "Failed to load Whisper model: {} does not exist",
                model_path.display()
            )));
        }
        let path = model_path.to_str().ok_or_else(|| {
            OmnitextError::Transcription(format!(
                "Failed to load Whisper model: {} is not valid UTF-8",
                model_path.display()
            ))
        })?;

        info!(model = %path, "Loading Whisper model");
        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                OmnitextError::Transcription(format!("Failed to load Whisper model: {e}"))
            })?;

        Ok(Self {
            context: Arc::new(Mutex::new(context)),
            model_path: Arc::new(model_path.to_path_buf()),
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Greedy-decode 16 kHz mono samples in `[-1.0, 1.0]`.
    pub async fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let samples = samples.to_vec();
        let context = Arc::clone(&self.context);

        debug!(
            seconds = samples.len() as f32 / TARGET_SAMPLE_RATE as f32,
            "Running Whisper"
        );

        let transcript = tokio::task::spawn_blocking(move || Self::decode(&context, &samples))
            .await
            .map_err(|e| {
                OmnitextError::Transcription(format!("Whisper task panicked: {e}"))
            })??;

        info!(
            characters = transcript.len(),
            words = transcript.split_whitespace().count(),
            "Whisper finished"
        );
        Ok(transcript)
    }

    fn decode(context: &Mutex<WhisperContext>, samples: &[f32]) -> Result<String> {
        let context = context
            .lock()
            .map_err(|_| OmnitextError::Transcription("Whisper model lock poisoned".to_string()))?;
        let mut state = context.create_state().map_err(|e| {
            OmnitextError::Transcription(format!("Failed to create Whisper state: {e}"))
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, samples)
            .map_err(|e| OmnitextError::Transcription(format!("Whisper decoding failed: {e}")))?;

        let mut segments = Vec::new();
        for i in 0..state.full_n_segments().max(0) {
            let segment = state.get_segment(i).ok_or_else(|| {
                OmnitextError::Transcription(format!("Whisper segment {i} missing"))
            })?;
            let text = segment.to_str().map_err(|e| {
                OmnitextError::Transcription(format!("Whisper segment {i} unreadable: {e}"))
            })?;
            segments.push(text.to_string());
        }

        Ok(join_segments(segments.iter().map(String::as_str)))
    }
}

/// Trim each segment, drop blank ones and join the rest with single spaces.
fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
