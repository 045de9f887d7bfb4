use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{OmnitextError, Result};
use crate::models::{DocumentFormat, ExtractedText};
use crate::traits::{MediaToolkit, SpeechTranscriber};

/// Length of each transcribed audio window, in seconds.
pub const VIDEO_CHUNK_SECS: f64 = 60.0;

/// A contiguous slice of the audio track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkWindow {
    pub index: usize,
    pub start_secs: f64,
    pub duration_secs: f64,
}

/// Split `[0, total_secs)` into consecutive windows of `VIDEO_CHUNK_SECS`.
/// The last window may be shorter. Non-positive durations give no windows.
pub fn plan_windows(total_secs: f64) -> Vec<ChunkWindow> {
    if !(total_secs.is_finite() && total_secs > 0.0) {
        return Vec::new();
    }

    let count = (total_secs / VIDEO_CHUNK_SECS).ceil() as usize;
    (0..count)
        .map(|index| {
            let start_secs = index as f64 * VIDEO_CHUNK_SECS;
            ChunkWindow {
                index,
                start_secs,
                duration_secs: VIDEO_CHUNK_SECS.min(total_secs - start_secs),
            }
        })
        .collect()
}

/// The message a failure carries, without the variant's prefix.
fn diagnostic(err: &OmnitextError) -> String {
    match err {
        OmnitextError::VideoTranscription(msg) | OmnitextError::Transcription(msg) => msg.clone(),
        other => other.to_string(),
    }
}

pub struct VideoExtractor;

impl VideoExtractor {
    /// Transcribe a video's audio track in fixed-length windows
    ///
    /// # Arguments
    /// * `path` - MP4 file
    /// * `media` - Probe and transcoder
    /// * `transcriber` - Speech-to-text engine
    /// * `scratch_dir` - Where window files are written; system temp dir when `None`
    ///
    /// # Returns
    /// One fragment per window that produced text, joined with spaces
    pub async fn extract(
        path: &Path,
        media: &dyn MediaToolkit,
        transcriber: &dyn SpeechTranscriber,
        scratch_dir: Option<&Path>,
    ) -> Result<ExtractedText> {
        let duration = media.probe_duration(path).await?;
        if !duration.is_finite() {
            return Err(OmnitextError::VideoProbe(format!(
                "Duration of {} is not a finite number: {duration}",
                path.display()
            )));
        }

        let windows = plan_windows(duration);
        info!(
            path = %path.display(),
            duration_secs = duration,
            windows = windows.len(),
            "Transcribing video"
        );

        let mut extracted = ExtractedText::for_format(DocumentFormat::Video);
        let mut failures = 0usize;
        let mut last_failure = None;

        for window in &windows {
            match Self::transcribe_window(path, window, media, transcriber, scratch_dir).await {
                Ok(text) => {
                    if !extracted.push(&text) {
                        debug!(window = window.index, "Window produced no speech");
                    }
                }
                Err(e) => {
                    warn!(
                        window = window.index,
                        start_secs = window.start_secs,
                        error = %e,
                        "Failed to transcribe video window, skipping"
                    );
                    failures += 1;
                    last_failure = Some(diagnostic(&e));
                }
            }
        }

        if !windows.is_empty() && failures == windows.len() {
            return Err(OmnitextError::VideoTranscription(
                last_failure.unwrap_or_default(),
            ));
        }

        Ok(extracted)
    }

    async fn transcribe_window(
        path: &Path,
        window: &ChunkWindow,
        media: &dyn MediaToolkit,
        transcriber: &dyn SpeechTranscriber,
        scratch_dir: Option<&Path>,
    ) -> Result<String> {
        let chunk = Self::chunk_file(scratch_dir)?;

        let result = async {
            media
                .extract_audio_window(path, window.start_secs, window.duration_secs, chunk.path())
                .await?;
            let bytes = tokio::fs::read(chunk.path()).await.map_err(|e| {
                OmnitextError::VideoTranscription(format!(
                    "Failed to read audio chunk {}: {e}",
                    chunk.path().display()
                ))
            })?;
            transcriber.transcribe(&bytes, Some("wav")).await
        }
        .await;

        let chunk_path = chunk.path().to_path_buf();
        if let Err(e) = chunk.close() {
            warn!(path = %chunk_path.display(), error = %e, "Failed to remove audio chunk");
        }

        result
    }

    fn chunk_file(scratch_dir: Option<&Path>) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("omnitext-chunk-").suffix(".wav");
        let file = match scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| {
            OmnitextError::VideoTranscription(format!("Failed to create audio chunk file: {e}"))
        })?;
        Ok(file)
    }
}
