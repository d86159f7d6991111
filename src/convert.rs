//! Conversion entry points: run the whole pipeline once.
//!
//! The run loop owns the [`PdfDocumentWriter`] and processes one image at a
//! time: decode, slice, OCR, lay out, append. Only after the last image is
//! the document finalized. Nothing is written if the run aborts part-way.

use crate::config::{ConversionConfig, DecodePolicy, FileOrder};
use crate::document::PdfDocumentWriter;
use crate::error::Img2PdfError;
use crate::output::{ConversionOutput, ConversionStats, ImagePlan, PageRecord, SkippedImage};
use crate::pipeline::input::{self, ImageFile};
use crate::pipeline::ocr::{self, OcrEngine, TesseractCli};
use crate::pipeline::order::{self, TimestampSource};
use crate::pipeline::{render, slice};
use image::{DynamicImage, ImageReader};
use std::borrow::Cow;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert the configured input directory into one PDF.
///
/// This is the primary entry point for the library. Files are ordered by
/// [`crate::config::FileOrder`] and, when `ocr_overlay` is on, recognised
/// with the `tesseract` binary named in the config.
///
/// # Errors
/// Returns `Err(Img2PdfError)` for fatal errors only:
/// - input directory missing or unreadable
/// - an image fails to decode (unless `on_decode_error` is `Skip`)
/// - no usable images
/// - the output file cannot be written
///
/// OCR failures are not errors; see [`ConversionStats::ocr_failures`].
pub fn convert(config: &ConversionConfig) -> Result<ConversionOutput, Img2PdfError> {
    let timestamps = order::source_for(config.file_order);
    if config.ocr_overlay {
        let engine = TesseractCli::new(&config.tesseract_binary, &config.ocr_language);
        if !engine.is_available() {
            warn!(
                "'{}' is not runnable; pages will be written without a text layer",
                engine.binary
            );
        }
        run(config, Some(&engine as &dyn OcrEngine), timestamps.as_deref())
    } else {
        run(config, None, timestamps.as_deref())
    }
}

/// Like [`convert`], with the OCR engine and timestamp source supplied by
/// the caller.
///
/// `ocr` is only consulted when `config.ocr_overlay` is set, and
/// `timestamps` is ignored under [`crate::config::FileOrder::Name`].
pub fn convert_with(
    config: &ConversionConfig,
    ocr: &dyn OcrEngine,
    timestamps: &dyn TimestampSource,
) -> Result<ConversionOutput, Img2PdfError> {
    let timestamps = (config.file_order != FileOrder::Name).then_some(timestamps);
    run(config, Some(ocr), timestamps)
}

/// Dry run: list, order and measure every image without writing anything.
///
/// Only image headers are read, so this is cheap even for large scans.
pub fn inspect(config: &ConversionConfig) -> Result<Vec<ImagePlan>, Img2PdfError> {
    let timestamps = order::source_for(config.file_order);
    let files = list_and_order(config, timestamps.as_deref())?;
    let ratio = config.aspect_ratio();

    Ok(files
        .into_iter()
        .map(|file| {
            let dims = read_dimensions(&file.path);
            let planned = dims.and_then(|(w, h)| {
                plan_for(w, h, ratio, config.slicing).map(|slices| (w, h, slices))
            });
            match planned {
                Ok((width, height, slices)) => ImagePlan {
                    path: file.path,
                    width,
                    height,
                    slices,
                    error: None,
                },
                Err(e) => ImagePlan {
                    path: file.path,
                    width: 0,
                    height: 0,
                    slices: Vec::new(),
                    error: Some(e.to_string()),
                },
            }
        })
        .collect())
}

// ── Run loop ─────────────────────────────────────────────────────────────

struct RunState {
    pages: Vec<PageRecord>,
    ocr_failures: usize,
    ocr_duration_ms: u64,
}

fn run(
    config: &ConversionConfig,
    ocr: Option<&dyn OcrEngine>,
    timestamps: Option<&dyn TimestampSource>,
) -> Result<ConversionOutput, Img2PdfError> {
    let total_start = Instant::now();
    info!(
        "Starting conversion: {} → {}",
        config.input_dir.display(),
        config.output_path.display()
    );

    // ── Step 1: List and order inputs ────────────────────────────────────
    let files = list_and_order(config, timestamps)?;
    let total = files.len();
    info!("Found {} image(s)", total);

    // Fail on an unwritable output before decoding or OCR'ing anything.
    let mut writer = PdfDocumentWriter::new(&config.output_path);
    writer.check_output()?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    // ── Step 2: Slice, OCR and append each image in order ────────────────
    let ocr = if config.ocr_overlay { ocr } else { None };
    let mut state = RunState {
        pages: Vec::new(),
        ocr_failures: 0,
        ocr_duration_ms: 0,
    };
    let mut skipped = Vec::new();

    for (i, file) in files.iter().enumerate() {
        let index = i + 1;
        info!("Processing {}/{}: {}", index, total, file.file_name);
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(index, total, &file.file_name);
        }

        match process_image(file, config, ocr, &mut writer, &mut state) {
            Ok(pages) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_complete(index, total, pages);
                }
            }
            Err(e) if is_skippable(&e) && config.on_decode_error == DecodePolicy::Skip => {
                warn!("Skipping {}: {}", file.path.display(), e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_error(index, total, &e.to_string());
                }
                skipped.push(SkippedImage {
                    path: file.path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    if writer.page_count() == 0 {
        return Err(Img2PdfError::NoUsableImages {
            path: config.input_dir.clone(),
            found: total,
        });
    }

    // ── Step 3: Finalize exactly once ────────────────────────────────────
    let pages_written = writer.finalize()?;

    let stats = ConversionStats {
        images_found: total,
        images_processed: total - skipped.len(),
        images_skipped: skipped.len(),
        pages_written,
        ocr_failures: state.ocr_failures,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        ocr_duration_ms: state.ocr_duration_ms,
    };

    info!(
        "Conversion complete: {} image(s) → {} page(s), {}ms total",
        stats.images_processed, stats.pages_written, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, pages_written);
    }

    Ok(ConversionOutput {
        output_path: config.output_path.clone(),
        pages: state.pages,
        skipped,
        stats,
    })
}

/// Decode one image and append all of its pages. Returns the page count.
///
/// Decoding and slice planning happen before the first append, so a bad
/// image never leaves a partial set of pages behind.
fn process_image(
    file: &ImageFile,
    config: &ConversionConfig,
    ocr: Option<&dyn OcrEngine>,
    writer: &mut PdfDocumentWriter,
    state: &mut RunState,
) -> Result<usize, Img2PdfError> {
    let img = decode_image(&file.path)?;
    let slices = plan_for(img.width(), img.height(), config.aspect_ratio(), config.slicing)?;
    info!(
        "  {}x{} px → {} page(s)",
        img.width(),
        img.height(),
        slices.len()
    );

    for s in &slices {
        let region: Cow<'_, DynamicImage> = if s.top == 0 && s.bottom == img.height() {
            Cow::Borrowed(&img)
        } else {
            Cow::Owned(slice::crop(&img, s))
        };

        let text = match ocr {
            Some(engine) => {
                let label = format!("{}#{}", file.file_name, s.index + 1);
                let ocr_start = Instant::now();
                let text = ocr::extract_text(engine, &region, &label);
                state.ocr_duration_ms += ocr_start.elapsed().as_millis() as u64;
                if text.is_none() {
                    state.ocr_failures += 1;
                }
                text
            }
            None => None,
        };

        let page = render::render_page(&region, text.as_deref(), config);
        let page_num = writer.append_page(&page)?;
        debug!(
            "  slice {} rows {}..{} → page {}",
            s.index + 1,
            s.top,
            s.bottom,
            page_num
        );

        state.pages.push(PageRecord {
            page_num,
            source: file.path.clone(),
            slice: *s,
            ocr_chars: text.map(|t| t.chars().count()),
        });
    }

    Ok(slices.len())
}

// The format is sniffed from the file's leading bytes; the extension is only
// a fallback. Screenshots saved as `.jpg` that are really PNGs are common.
fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, image::ImageError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

fn decode_image(path: &Path) -> Result<DynamicImage, Img2PdfError> {
    open_reader(path)
        .and_then(|reader| reader.decode())
        .map_err(|e| Img2PdfError::ImageDecodeFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Header-only read of `(width, height)`.
fn read_dimensions(path: &Path) -> Result<(u32, u32), Img2PdfError> {
    open_reader(path)
        .and_then(|reader| reader.into_dimensions())
        .map_err(|e| Img2PdfError::ImageDecodeFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

fn list_and_order(
    config: &ConversionConfig,
    timestamps: Option<&dyn TimestampSource>,
) -> Result<Vec<ImageFile>, Img2PdfError> {
    let files = input::list_images(&config.input_dir)?;
    match timestamps {
        Some(source) => order::sort_by_timestamp(files, source),
        None => Ok(files),
    }
}

fn plan_for(
    width: u32,
    height: u32,
    ratio: f64,
    slicing: bool,
) -> Result<Vec<slice::Slice>, Img2PdfError> {
    if slicing {
        slice::plan_slices(width, height, ratio)
    } else {
        slice::whole_image(width, height)
    }
}

fn is_skippable(e: &Img2PdfError) -> bool {
    matches!(
        e,
        Img2PdfError::ImageDecodeFailed { .. } | Img2PdfError::DegenerateImage { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_image_mode_plans_one_slice() {
        let plan = plan_for(1000, 3000, 1.414, false).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!((plan[0].top, plan[0].bottom), (0, 3000));
        assert_eq!(plan_for(1000, 3000, 1.414, true).unwrap().len(), 3);
    }

    #[test]
    fn only_image_errors_are_skippable() {
        assert!(is_skippable(&Img2PdfError::DegenerateImage {
            width: 0,
            height: 1
        }));
        assert!(!is_skippable(&Img2PdfError::DocumentFinalized));
        assert!(!is_skippable(&Img2PdfError::InputDirNotFound {
            path: "x".into()
        }));
    }

    #[test]
    fn decoder_follows_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.jpg");
        let png = image::RgbImage::from_pixel(7, 5, image::Rgb([9, 9, 9]));
        png.save_with_format(&path, image::ImageFormat::Png).unwrap();

        assert_eq!(read_dimensions(&path).unwrap(), (7, 5));
        let img = decode_image(&path).unwrap();
        assert_eq!((img.width(), img.height()), (7, 5));
    }
}
