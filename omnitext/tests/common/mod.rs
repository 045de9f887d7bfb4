#![allow(dead_code)]

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use omnitext::traits::{MediaToolkit, PageRasterizer, SpeechTranscriber, TextRecognizer};
use omnitext::{ContentExtractor, OmnitextError, Result};

/// Recognizer that returns the same text for every image.
pub struct FakeRecognizer {
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
}

impl FakeRecognizer {
    pub fn new(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for FakeRecognizer {
    async fn recognize(&self, _image_bytes: &[u8]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(OmnitextError::Ocr)
    }
}

/// Rasterizer that hands back a tiny PNG per page and records every request.
pub struct FakeRasterizer {
    page_count: usize,
    fail: bool,
    pub page_requests: Mutex<Vec<(u32, u32)>>,
    pub full_requests: Mutex<Vec<u32>>,
}

impl FakeRasterizer {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            fail: false,
            page_requests: Mutex::new(Vec::new()),
            full_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0)
        }
    }
}

#[async_trait]
impl PageRasterizer for FakeRasterizer {
    async fn render_page(&self, _pdf: &Path, page_number: u32, dpi: u32) -> Result<Vec<u8>> {
        self.page_requests.lock().unwrap().push((page_number, dpi));
        if self.fail {
            return Err(OmnitextError::PdfExtraction("pdftoppm missing".to_string()));
        }
        Ok(png_bytes())
    }

    async fn render_all(&self, _pdf: &Path, dpi: u32) -> Result<Vec<Vec<u8>>> {
        self.full_requests.lock().unwrap().push(dpi);
        if self.fail {
            return Err(OmnitextError::PdfExtraction("pdftoppm missing".to_string()));
        }
        Ok((0..self.page_count).map(|_| png_bytes()).collect())
    }
}

/// Transcriber that answers `chunk N` for the Nth call and fails on chosen calls.
pub struct FakeTranscriber {
    fail_on: HashSet<usize>,
    calls: AtomicUsize,
    pub hints: Mutex<Vec<Option<String>>>,
}

impl FakeTranscriber {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            fail_on: calls.iter().copied().collect(),
            calls: AtomicUsize::new(0),
            hints: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechTranscriber for FakeTranscriber {
    async fn transcribe(&self, audio_bytes: &[u8], format_hint: Option<&str>) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.hints
            .lock()
            .unwrap()
            .push(format_hint.map(str::to_string));

        if audio_bytes.is_empty() {
            return Err(OmnitextError::Transcription("no audio".to_string()));
        }
        if self.fail_on.contains(&call) {
            return Err(OmnitextError::Transcription(format!(
                "decoder error on call {call}"
            )));
        }
        Ok(format!("  chunk {call}\n"))
    }
}

/// A recorded `extract_audio_window` call.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowCall {
    pub start_secs: f64,
    pub duration_secs: f64,
    pub dest: PathBuf,
    pub dest_existed: bool,
}

/// Media toolkit with a fixed duration that writes a stub WAV per window.
pub struct FakeMedia {
    duration: std::result::Result<f64, fn() -> OmnitextError>,
    fail_windows: HashSet<usize>,
    pub windows: Mutex<Vec<WindowCall>>,
}

impl FakeMedia {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Ok(duration),
            fail_windows: HashSet::new(),
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn probe_error(make: fn() -> OmnitextError) -> Self {
        Self {
            duration: Err(make),
            fail_windows: HashSet::new(),
            windows: Mutex::new(Vec::new()),
        }
    }

    /// Fail transcoding for the given 0-based window indices.
    pub fn failing_windows(mut self, indices: &[usize]) -> Self {
        self.fail_windows = indices.iter().copied().collect();
        self
    }

    pub fn calls(&self) -> Vec<WindowCall> {
        self.windows.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn probe_duration(&self, _media: &Path) -> Result<f64> {
        match &self.duration {
            Ok(duration) => Ok(*duration),
            Err(make) => Err(make()),
        }
    }

    async fn extract_audio_window(
        &self,
        _media: &Path,
        start_secs: f64,
        duration_secs: f64,
        dest: &Path,
    ) -> Result<()> {
        let index = {
            let mut windows = self.windows.lock().unwrap();
            windows.push(WindowCall {
                start_secs,
                duration_secs,
                dest: dest.to_path_buf(),
                dest_existed: dest.exists(),
            });
            windows.len() - 1
        };

        if self.fail_windows.contains(&index) {
            return Err(OmnitextError::VideoTranscription(format!(
                "ffmpeg: window {index} has no audio stream"
            )));
        }

        std::fs::write(dest, wav_stub())?;
        Ok(())
    }
}

pub fn png_bytes() -> Vec<u8> {
    let mut output = Vec::new();
    image::DynamicImage::new_rgb8(8, 8)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .unwrap();
    output
}

pub fn wav_stub() -> Vec<u8> {
    let mut wav = Vec::new();
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&36u32.to_le_bytes());
    wav.extend_from_slice(b"WAVEfmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&16000u32.to_le_bytes());
    wav.extend_from_slice(&32000u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&0u32.to_le_bytes());
    wav
}

/// Fakes wired into a `ContentExtractor`, kept for later assertions.
pub struct Harness {
    pub recognizer: Arc<FakeRecognizer>,
    pub rasterizer: Arc<FakeRasterizer>,
    pub transcriber: Arc<FakeTranscriber>,
    pub media: Arc<FakeMedia>,
    pub scratch: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(
            FakeRecognizer::new("recognized text"),
            FakeRasterizer::new(2),
            FakeTranscriber::new(),
            FakeMedia::with_duration(0.0),
        )
    }

    pub fn with(
        recognizer: FakeRecognizer,
        rasterizer: FakeRasterizer,
        transcriber: FakeTranscriber,
        media: FakeMedia,
    ) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            rasterizer: Arc::new(rasterizer),
            transcriber: Arc::new(transcriber),
            media: Arc::new(media),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    pub fn extractor(&self) -> ContentExtractor {
        ContentExtractor::new(
            self.recognizer.clone(),
            self.rasterizer.clone(),
            self.transcriber.clone(),
            self.media.clone(),
        )
        .with_scratch_dir(Some(self.scratch.path().to_path_buf()))
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

pub fn create_test_docx<F>(builder_fn: F) -> Vec<u8>
where
    F: FnOnce(docx_rs::Docx) -> docx_rs::Docx,
{
    let docx = builder_fn(docx_rs::Docx::new());
    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}

/// Zip archive holding the given entries, stored in the given order.
pub fn create_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// A PDF with one page per entry; an empty entry yields a page without text.
pub fn create_pdf(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
