use std::io::Cursor;

use rubato::{FftFixedIn, Resampler};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::debug;

use crate::error::{OmnitextError, Result};

/// Sample rate Whisper expects.
pub const TARGET_SAMPLE_RATE: u32 = 16000;
const RESAMPLE_BLOCK: usize = 1024;
const RESAMPLE_SUB_CHUNKS: usize = 2;

/// Audio preprocessing for transcription
pub struct AudioPreprocessor;

impl AudioPreprocessor {
    /// Decode audio bytes into mono f32 PCM samples and their sample rate.
    ///
    /// Supports MP3, WAV and the audio track of MP4 containers via symphonia.
    /// Multi-channel audio is down-mixed by averaging the channels of each frame.
    /// Corrupt packets are skipped; a stream that yields no samples at all is an error.
    pub fn decode_mono(bytes: &[u8], format_hint: Option<&str>) -> Result<(Vec<f32>, u32)> {
        if bytes.is_empty() {
            return Err(OmnitextError::Transcription("Empty audio data".to_string()));
        }

        let mut hint = Hint::new();
        if let Some(ext) = format_hint {
            hint.with_extension(ext);
        }

        let source =
            MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
        let mut reader = symphonia::default::get_probe()
            .format(
                &hint,
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| OmnitextError::Transcription(format!("Unrecognized audio container: {e}")))?
            .format;

        let (track_id, params) = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .map(|t| (t.id, t.codec_params.clone()))
            .ok_or_else(|| OmnitextError::Transcription("No audio track in stream".to_string()))?;

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| OmnitextError::Transcription("Audio track has no sample rate".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| OmnitextError::Transcription(format!("Unsupported audio codec: {e}")))?;

        debug!(sample_rate, codec = ?params.codec, "Decoding audio track");

        let mut samples = Vec::new();
        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => {
                    return Err(OmnitextError::Transcription(format!(
                        "Audio stream read error: {e}"
                    )))
                }
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => Self::downmix_into(&mut samples, decoded),
                Err(SymphoniaError::DecodeError(e)) => debug!(error = e, "Skipping corrupt packet"),
                Err(e) => {
                    return Err(OmnitextError::Transcription(format!(
                        "Audio decoder error: {e}"
                    )))
                }
            }
        }

        if samples.is_empty() {
            return Err(OmnitextError::Transcription(
                "Audio stream contains no samples".to_string(),
            ));
        }

        debug!(samples = samples.len(), sample_rate, "Decoded mono audio");
        Ok((samples, sample_rate))
    }

    fn downmix_into(samples: &mut Vec<f32>, buffer: AudioBufferRef) {
        match buffer {
            AudioBufferRef::U8(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::U16(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::U24(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::U32(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::S8(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::S16(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::S24(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::S32(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::F32(buf) => Self::downmix(samples, &buf),
            AudioBufferRef::F64(buf) => Self::downmix(samples, &buf),
        }
    }

    fn downmix<S>(samples: &mut Vec<f32>, buf: &AudioBuffer<S>)
    where
        S: Sample,
        f32: FromSample<S>,
    {
        let channels = buf.spec().channels.count().max(1);
        samples.reserve(buf.frames());
        for frame in 0..buf.frames() {
            let mut sum = 0.0f32;
            for ch in 0..channels {
                sum += f32::from_sample(buf.chan(ch)[frame]);
            }
            samples.push(sum / channels as f32);
        }
    }

    /// Resample mono audio to [`TARGET_SAMPLE_RATE`].
    ///
    /// The input is fed to the FFT resampler in fixed blocks, the last one
    /// zero-padded, and the output is cut back to the length the rate ratio
    /// predicts. Clips too short to yield a single output sample are rejected.
    pub fn resample_to_16khz(samples: Vec<f32>, sample_rate: u32) -> Result<Vec<f32>> {
        if samples.is_empty() {
            return Err(OmnitextError::Transcription(
                "Empty samples for resampling".to_string(),
            ));
        }
        if sample_rate == TARGET_SAMPLE_RATE {
            return Ok(samples);
        }

        let mut resampler = FftFixedIn::<f32>::new(
            sample_rate as usize,
            TARGET_SAMPLE_RATE as usize,
            RESAMPLE_BLOCK,
            RESAMPLE_SUB_CHUNKS,
            1,
        )
        .map_err(|e| OmnitextError::Transcription(format!("Failed to create resampler: {e}")))?;

        let block_len = resampler.input_frames_next();
        let expected_len =
            (samples.len() as u64 * TARGET_SAMPLE_RATE as u64 / sample_rate as u64) as usize;
        let mut resampled = Vec::with_capacity(expected_len + resampler.output_frames_max());

        for block in samples.chunks(block_len) {
            let mut input = block.to_vec();
            input.resize(block_len, 0.0);
            let output = resampler
                .process(&[input], None)
                .map_err(|e| OmnitextError::Transcription(format!("Resampling failed: {e}")))?;
            resampled.extend_from_slice(&output[0]);
        }
        resampled.truncate(expected_len);

        if resampled.is_empty() {
            return Err(OmnitextError::Transcription(format!(
                "Audio too short to transcribe: {} samples at {sample_rate} Hz",
                samples.len()
            )));
        }

        debug!(
            from_hz = sample_rate,
            input = samples.len(),
            output = resampled.len(),
            "Resampled audio"
        );
        Ok(resampled)
    }

    /// Decode any supported audio file into 16kHz mono samples for Whisper.
    pub fn prepare_for_whisper(bytes: &[u8], format_hint: Option<&str>) -> Result<Vec<f32>> {
        let (samples, sample_rate) = Self::decode_mono(bytes, format_hint)?;
        Self::resample_to_16khz(samples, sample_rate)
    }
}
