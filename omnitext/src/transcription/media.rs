use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::preprocessing::TARGET_SAMPLE_RATE;
use crate::config::MediaConfig;
use crate::error::{OmnitextError, Result};
use crate::traits::MediaToolkit;

/// `MediaToolkit` backed by the `ffprobe` and `ffmpeg` binaries.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl Ffmpeg {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(&config.ffmpeg_bin, &config.ffprobe_bin)
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

fn parse_duration(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    value.parse::<f64>().map_err(|e| {
        OmnitextError::VideoProbe(format!("Unexpected ffprobe output '{value}': {e}"))
    })
}

/// Seconds formatted the way ffmpeg's `-ss`/`-t` accept them.
fn seconds_arg(secs: f64) -> String {
    format!("{secs:.3}")
}

#[async_trait]
impl MediaToolkit for Ffmpeg {
    async fn probe_duration(&self, media: &Path) -> Result<f64> {
        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(media)
            .output()
            .await
            .map_err(|e| {
                OmnitextError::VideoProbe(format!(
                    "Failed to execute {}: {e}. Ensure ffmpeg is installed.",
                    self.ffprobe_bin
                ))
            })?;

        if !output.status.success() {
            return Err(OmnitextError::VideoTranscription(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))?;
        debug!(path = %media.display(), duration, "Probed media duration");
        Ok(duration)
    }

    async fn extract_audio_window(
        &self,
        media: &Path,
        start_secs: f64,
        duration_secs: f64,
        dest: &Path,
    ) -> Result<()> {
        let output = Command::new(&self.ffmpeg_bin)
            .arg("-y")
            .arg("-i")
            .arg(media)
            .arg("-ss")
            .arg(seconds_arg(start_secs))
            .arg("-t")
            .arg(seconds_arg(duration_secs))
            .args(["-vn", "-acodec", "pcm_s16le", "-ar"])
            .arg(TARGET_SAMPLE_RATE.to_string())
            .args(["-ac", "1"])
            .arg(dest)
            .output()
            .await
            .map_err(|e| {
                OmnitextError::VideoTranscription(format!(
                    "Failed to execute {}: {e}. Ensure ffmpeg is installed.",
                    self.ffmpeg_bin
                ))
            })?;

        if !output.status.success() {
            return Err(OmnitextError::VideoTranscription(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        Ok(())
    }
}
