//! End-to-end integration tests for edgequake-img2pdf.
//!
//! Every test builds its own input directory from generated images and runs
//! the full pipeline into a temp file, then reads the PDF back with lopdf.
//! OCR and file timestamps are faked so the results are deterministic.
//!
//! The one test that needs a real `tesseract` binary is gated behind
//! `TESSERACT_E2E`:
//!   TESSERACT_E2E=1 cargo test --test e2e -- --nocapture

use edgequake_img2pdf::{
    convert, convert_with, inspect, ConversionConfig, DecodePolicy, FileOrder, Img2PdfError,
    OcrEngine, OcrError, Variant,
};
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::Content;
use lopdf::{Document, Object};
use std::cell::Cell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Writes a solid-colour image; the format follows the extension.
fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([240, 240, 240]))
        .save(&path)
        .unwrap();
    path
}

fn config_for(input: &Path, output: &Path) -> edgequake_img2pdf::ConversionConfigBuilder {
    ConversionConfig::builder()
        .input_dir(input)
        .output_path(output)
        .file_order(FileOrder::Name)
}

/// Timestamp source backed by a name → seconds table.
fn fake_times(
    table: &[(&str, u64)],
) -> impl Fn(&Path) -> Result<SystemTime, Img2PdfError> {
    let table: HashMap<String, u64> = table.iter().map(|(n, s)| (n.to_string(), *s)).collect();
    move |path: &Path| {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        Ok(UNIX_EPOCH + Duration::from_secs(table[&name]))
    }
}

/// OCR engine that reports the slice size as its text.
struct SizeOcr;

impl OcrEngine for SizeOcr {
    fn name(&self) -> &'static str {
        "size"
    }

    fn recognize(&self, img: &DynamicImage) -> Result<String, OcrError> {
        Ok(format!("slice {}x{}\n\n\n\nend", img.width(), img.height()))
    }
}

struct BrokenOcr;

impl OcrEngine for BrokenOcr {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn recognize(&self, _img: &DynamicImage) -> Result<String, OcrError> {
        Err(OcrError::Failed {
            status: "exit status: 1".into(),
            stderr: "simulated".into(),
        })
    }
}

/// Counts how many slices reached the engine.
#[derive(Default)]
struct CountingOcr {
    calls: Cell<usize>,
}

impl OcrEngine for CountingOcr {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn recognize(&self, _img: &DynamicImage) -> Result<String, OcrError> {
        self.calls.set(self.calls.get() + 1);
        Ok("text".into())
    }
}

fn epoch_order() -> impl Fn(&Path) -> Result<SystemTime, Img2PdfError> {
    |_: &Path| Ok(UNIX_EPOCH)
}

/// Literal strings shown with `Tj` on a page, in content-stream order.
fn page_text(doc: &Document, page_num: u32) -> Vec<String> {
    let id = doc.get_pages()[&page_num];
    let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
    content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect()
}

fn media_box(doc: &Document, page_num: u32) -> (f32, f32) {
    let id = doc.get_pages()[&page_num];
    let page = doc.get_object(id).unwrap().as_dict().unwrap();
    let rect = page.get(b"MediaBox").unwrap().as_array().unwrap();
    (rect[2].as_float().unwrap(), rect[3].as_float().unwrap())
}

fn dirs() -> (TempDir, TempDir) {
    (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap())
}

// ── Slicing ──────────────────────────────────────────────────────────────────

#[test]
fn tall_image_becomes_three_a4_pages() {
    let (input, out) = dirs();
    write_image(input.path(), "long.png", 1000, 3000);
    let output = out.path().join("output.pdf");

    let config = config_for(input.path(), &output).build().unwrap();
    let result = convert_with(&config, &SizeOcr, &epoch_order()).unwrap();

    assert_eq!(result.stats.pages_written, 3);
    let heights: Vec<u32> = result.pages.iter().map(|p| p.slice.height()).collect();
    assert_eq!(heights, vec![1414, 1414, 172]);
    assert!(result.pages.iter().all(|p| p.ocr_chars.is_none()));

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 3);
    let (w, h) = media_box(&doc, 1);
    assert!((w - 595.2756).abs() < 0.01, "width {w}");
    assert!((h - 841.8898).abs() < 0.01, "height {h}");
    // No OCR requested: no text layer.
    assert!(page_text(&doc, 1).is_empty());
}

#[test]
fn whole_image_variant_writes_one_page_per_image() {
    let (input, out) = dirs();
    write_image(input.path(), "a.png", 1000, 3000);
    write_image(input.path(), "b.jpg", 400, 300);
    let output = out.path().join("whole.pdf");

    let config = config_for(input.path(), &output)
        .variant(Variant::WholeImageOcr)
        .build()
        .unwrap();
    let result = convert_with(&config, &SizeOcr, &epoch_order()).unwrap();

    assert_eq!(result.stats.pages_written, 2);
    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
    assert_eq!(page_text(&doc, 1)[0], "slice 1000x3000");
    assert_eq!(page_text(&doc, 2)[0], "slice 400x300");
}

// ── Ordering ─────────────────────────────────────────────────────────────────

#[test]
fn pages_follow_timestamps_not_names() {
    let (input, out) = dirs();
    for name in ["a.png", "b.png", "c.png"] {
        write_image(input.path(), name, 100, 100);
    }
    let output = out.path().join("ordered.pdf");
    let times = fake_times(&[("a.png", 20), ("b.png", 30), ("c.png", 10)]);

    let config = ConversionConfig::builder()
        .input_dir(input.path())
        .output_path(&output)
        .build()
        .unwrap();
    let result = convert_with(&config, &SizeOcr, &times).unwrap();

    let order: Vec<String> = result
        .pages
        .iter()
        .map(|p| p.source.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(order, vec!["c.png", "a.png", "b.png"]);
    let nums: Vec<usize> = result.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(nums, vec![1, 2, 3]);
}

#[test]
fn equal_timestamps_fall_back_to_name_order() {
    let (input, out) = dirs();
    for name in ["z.png", "m.png", "a.png"] {
        write_image(input.path(), name, 50, 50);
    }
    let output = out.path().join("ties.pdf");

    let config = ConversionConfig::builder()
        .input_dir(input.path())
        .output_path(&output)
        .build()
        .unwrap();
    let first = convert_with(&config, &SizeOcr, &epoch_order()).unwrap();
    let second = convert_with(&config, &SizeOcr, &epoch_order()).unwrap();

    let names = |out: &edgequake_img2pdf::ConversionOutput| -> Vec<PathBuf> {
        out.pages.iter().map(|p| p.source.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert!(names(&first)[0].ends_with("a.png"));
    assert!(names(&first)[2].ends_with("z.png"));
}

// ── OCR overlay ──────────────────────────────────────────────────────────────

#[test]
fn ocr_text_is_embedded_per_slice() {
    let (input, out) = dirs();
    write_image(input.path(), "scan.png", 1000, 3000);
    let output = out.path().join("ocr.pdf");

    let config = config_for(input.path(), &output)
        .ocr_overlay(true)
        .build()
        .unwrap();
    let result = convert_with(&config, &SizeOcr, &epoch_order()).unwrap();
    assert_eq!(result.stats.ocr_failures, 0);

    let doc = Document::load(&output).unwrap();
    // Runs of blank lines collapse to one empty line.
    assert_eq!(page_text(&doc, 1), vec!["slice 1000x1414", "", "end"]);
    assert_eq!(page_text(&doc, 3), vec!["slice 1000x172", "", "end"]);
    assert_eq!(result.pages[0].ocr_chars, Some("slice 1000x1414\n\nend".len()));
}

#[test]
fn ocr_failure_keeps_image_only_page() {
    let (input, out) = dirs();
    write_image(input.path(), "a.png", 200, 200);
    write_image(input.path(), "b.png", 200, 200);
    let output = out.path().join("degraded.pdf");

    let config = config_for(input.path(), &output)
        .ocr_overlay(true)
        .build()
        .unwrap();
    let result = convert_with(&config, &BrokenOcr, &epoch_order()).unwrap();

    assert_eq!(result.stats.pages_written, 2);
    assert_eq!(result.stats.ocr_failures, 2);
    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
    assert!(page_text(&doc, 1).is_empty());
}

// ── Failure modes ────────────────────────────────────────────────────────────

#[test]
fn corrupt_image_aborts_without_output() {
    let (input, out) = dirs();
    write_image(input.path(), "a.png", 100, 100);
    std::fs::write(input.path().join("b.png"), b"definitely not a png").unwrap();
    let output = out.path().join("abort.pdf");

    let config = config_for(input.path(), &output).build().unwrap();
    let err = convert_with(&config, &SizeOcr, &epoch_order()).unwrap_err();

    assert!(matches!(err, Img2PdfError::ImageDecodeFailed { .. }), "{err}");
    assert_eq!(err.class(), "ImageDecodeError");
    assert!(!output.exists());
}

#[test]
fn corrupt_image_is_skipped_on_request() {
    let (input, out) = dirs();
    write_image(input.path(), "a.png", 100, 100);
    std::fs::write(input.path().join("b.png"), b"definitely not a png").unwrap();
    write_image(input.path(), "c.png", 100, 100);
    let output = out.path().join("skip.pdf");

    let config = config_for(input.path(), &output)
        .on_decode_error(DecodePolicy::Skip)
        .build()
        .unwrap();
    let result = convert_with(&config, &SizeOcr, &epoch_order()).unwrap();

    assert_eq!(result.stats.images_found, 3);
    assert_eq!(result.stats.images_skipped, 1);
    assert_eq!(result.stats.pages_written, 2);
    assert!(result.skipped[0].path.ends_with("b.png"));
    assert_eq!(Document::load(&output).unwrap().get_pages().len(), 2);
}

#[test]
fn empty_directory_is_an_error() {
    let (input, out) = dirs();
    std::fs::write(input.path().join("notes.txt"), b"not an image").unwrap();
    let output = out.path().join("empty.pdf");

    let config = config_for(input.path(), &output).build().unwrap();
    let err = convert_with(&config, &SizeOcr, &epoch_order()).unwrap_err();

    assert!(matches!(err, Img2PdfError::NoUsableImages { found: 0, .. }));
    assert_eq!(err.class(), "FilesystemError");
    assert!(!output.exists());
}

#[test]
fn missing_input_directory_is_reported() {
    let out = tempfile::tempdir().unwrap();
    let config = config_for(&out.path().join("nope"), &out.path().join("x.pdf"))
        .build()
        .unwrap();
    let err = convert(&config).unwrap_err();
    assert!(matches!(err, Img2PdfError::InputDirNotFound { .. }));
}

#[test]
fn image_with_wrong_extension_still_converts() {
    let (input, out) = dirs();
    let path = input.path().join("shot.jpg");
    RgbImage::from_pixel(300, 200, Rgb([10, 200, 10]))
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    let output = out.path().join("misnamed.pdf");

    let config = config_for(input.path(), &output).build().unwrap();
    let plans = inspect(&config).unwrap();
    assert_eq!(plans[0].error, None);
    assert_eq!((plans[0].width, plans[0].height), (300, 200));

    let result = convert_with(&config, &SizeOcr, &epoch_order()).unwrap();
    assert_eq!(result.stats.pages_written, 1);
    assert_eq!(Document::load(&output).unwrap().get_pages().len(), 1);
}

#[test]
fn unwritable_output_fails_before_any_ocr() {
    let (input, out) = dirs();
    write_image(input.path(), "tall.png", 100, 1000);
    let blocker = out.path().join("not_a_dir");
    std::fs::write(&blocker, b"regular file").unwrap();
    let output = blocker.join("o.pdf");

    let config = config_for(input.path(), &output)
        .ocr_overlay(true)
        .build()
        .unwrap();
    let engine = CountingOcr::default();
    let err = convert_with(&config, &engine, &epoch_order()).unwrap_err();

    assert!(matches!(err, Img2PdfError::OutputWriteFailed { .. }), "{err}");
    assert_eq!(err.class(), "FilesystemError");
    assert_eq!(engine.calls.get(), 0);
}

// ── Dry run ──────────────────────────────────────────────────────────────────

#[test]
fn inspect_plans_pages_and_writes_nothing() {
    let (input, out) = dirs();
    write_image(input.path(), "long.png", 1000, 3000);
    std::fs::write(input.path().join("bad.png"), b"junk").unwrap();
    let output = out.path().join("never.pdf");

    let config = config_for(input.path(), &output).build().unwrap();
    let plans = inspect(&config).unwrap();

    assert_eq!(plans.len(), 2);
    assert!(plans[0].error.is_some(), "bad.png sorts first");
    assert_eq!(plans[1].slices.len(), 3);
    assert_eq!((plans[1].width, plans[1].height), (1000, 3000));
    assert!(!output.exists());
}

// ── Real tesseract (opt-in) ──────────────────────────────────────────────────

#[test]
fn real_tesseract_run_completes() {
    if std::env::var("TESSERACT_E2E").is_err() {
        println!("SKIP — set TESSERACT_E2E=1 to run with a real tesseract binary");
        return;
    }
    let (input, out) = dirs();
    write_image(input.path(), "blank.png", 600, 900);
    let output = out.path().join("real.pdf");

    let config = config_for(input.path(), &output)
        .ocr_overlay(true)
        .build()
        .unwrap();
    let result = convert(&config).unwrap();

    assert_eq!(result.stats.pages_written, 1);
    assert_eq!(result.stats.ocr_failures, 0);
    assert!(output.exists());
}
