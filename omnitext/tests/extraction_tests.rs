mod common;

use std::path::Path;

use common::{
    create_test_docx, png_bytes, wav_stub, write_file, FakeMedia, FakeRasterizer, FakeRecognizer,
    FakeTranscriber, Harness,
};

use omnitext::{detect_format, DocumentFormat, OmnitextError};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_unsupported_extension_is_rejected() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "sheet.xlsx", b"PK");

    let result = h.extractor().extract(&path).await;

    match result {
        Err(OmnitextError::UnsupportedFormat(ext)) => assert_eq!(ext, "xlsx"),
        other => panic!("Expected UnsupportedFormat, got {other:?}"),
    }
    assert_eq!(h.recognizer.calls(), 0);
    assert_eq!(h.transcriber.calls(), 0);
}

#[tokio::test]
async fn test_missing_extension_is_rejected() {
    let h = Harness::new();
    let result = h.extractor().extract(Path::new("Makefile")).await;

    match result {
        Err(e @ OmnitextError::UnsupportedFormat(_)) => {
            assert_eq!(e.to_string(), "Unsupported file type: .");
            assert_eq!(e.exit_code(), 2);
        }
        other => panic!("Expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn test_extension_matching_ignores_case() {
    assert_eq!(
        detect_format(Path::new("SCAN.PNG")).unwrap(),
        DocumentFormat::Image
    );
    assert_eq!(
        detect_format(Path::new("Talk.Mp4")).unwrap(),
        DocumentFormat::Video
    );
}

#[tokio::test]
async fn test_image_is_routed_to_ocr() {
    let h = Harness::with(
        FakeRecognizer::new("  Receipt #42  "),
        FakeRasterizer::new(0),
        FakeTranscriber::new(),
        FakeMedia::with_duration(0.0),
    );
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "receipt.jpeg", &png_bytes());

    let text = h.extractor().extract(&path).await.unwrap();

    assert_eq!(text, "Receipt #42");
    assert_eq!(h.recognizer.calls(), 1);
}

#[tokio::test]
async fn test_ocr_failure_propagates() {
    let h = Harness::with(
        FakeRecognizer::failing("tesseract crashed"),
        FakeRasterizer::new(0),
        FakeTranscriber::new(),
        FakeMedia::with_duration(0.0),
    );
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "scan.png", &png_bytes());

    let result = h.extractor().extract(&path).await;

    match result {
        Err(OmnitextError::Ocr(msg)) => assert!(msg.contains("tesseract crashed")),
        other => panic!("Expected Ocr error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_audio_is_transcribed_in_one_call() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "memo.WAV", &wav_stub());

    let text = h.extractor().extract(&path).await.unwrap();

    assert_eq!(text, "chunk 1");
    assert_eq!(h.transcriber.calls(), 1);
    assert_eq!(
        *h.transcriber.hints.lock().unwrap(),
        vec![Some("WAV".to_string())]
    );
    assert!(h.media.calls().is_empty());
}

#[tokio::test]
async fn test_transcription_failure_propagates() {
    let h = Harness::with(
        FakeRecognizer::new("unused"),
        FakeRasterizer::new(0),
        FakeTranscriber::failing_on(&[1]),
        FakeMedia::with_duration(0.0),
    );
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "memo.mp3", &[0xFF, 0xFB, 0x90, 0x00]);

    let result = h.extractor().extract(&path).await;

    assert!(matches!(result, Err(OmnitextError::Transcription(_))));
}

#[tokio::test]
async fn test_utf8_text_round_trips() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "greeting.txt", "héllo".as_bytes());

    let text = h.extractor().extract(&path).await.unwrap();

    assert_eq!(text, "héllo");
}

#[tokio::test]
async fn test_latin1_text_falls_back() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    // "naïve café" in Latin-1
    let bytes = b"  na\xEFve caf\xE9\n";
    let path = write_file(dir.path(), "legacy.txt", bytes);

    let text = h.extractor().extract(&path).await.unwrap();

    assert_eq!(text, "naïve café");
}

#[tokio::test]
async fn test_missing_text_file_is_text_read_failure() {
    let h = Harness::new();
    let result = h
        .extractor()
        .extract(Path::new("/nonexistent/notes.txt"))
        .await;

    match result {
        Err(e @ OmnitextError::TextRead(_)) => assert_eq!(e.kind(), "text_read_failure"),
        other => panic!("Expected TextRead error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_extraction_is_idempotent() {
    use docx_rs::*;

    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let docx = create_test_docx(|docx| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text("Same every time")))
    });
    let files = [
        write_file(dir.path(), "a.docx", &docx),
        write_file(dir.path(), "b.txt", b"plain text"),
        write_file(dir.path(), "c.png", &png_bytes()),
    ];
    let extractor = h.extractor();

    for path in &files {
        let first = extractor.extract(path).await.unwrap();
        let second = extractor.extract(path).await.unwrap();
        assert_eq!(first, second, "{}", path.display());
    }
}

#[tokio::test]
async fn test_text_output_is_trimmed_at_edges() {
    let h = Harness::new();
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "notes.txt", b"\n\n  first\n  \nsecond\n\n");

    let text = h.extractor().extract(&path).await.unwrap();

    assert_eq!(text, text.trim());
    assert_eq!(text, "first\n  \nsecond");
}

#[test]
fn test_unsupported_format_from_sync_caller() {
    let h = Harness::new();
    let result = tokio_test::block_on(h.extractor().extract(Path::new("archive.tar.gz")));
    assert!(matches!(result, Err(OmnitextError::UnsupportedFormat(ext)) if ext == "gz"));
}
