//! Result types returned by the conversion entry points.

use crate::pipeline::slice::Slice;
use serde::Serialize;
use std::path::PathBuf;

/// Everything a caller may want to know about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Where the PDF was written.
    pub output_path: PathBuf,
    /// One record per written page, in document order.
    pub pages: Vec<PageRecord>,
    /// Files skipped under [`crate::config::DecodePolicy::Skip`].
    pub skipped: Vec<SkippedImage>,
    pub stats: ConversionStats,
}

/// Provenance of one output page.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    /// 1-indexed page number in the output document.
    pub page_num: usize,
    /// Source image.
    pub source: PathBuf,
    /// Pixel bounds of the slice within the source image.
    pub slice: Slice,
    /// Characters in the text layer; `None` when no OCR ran or it failed.
    pub ocr_chars: Option<usize>,
}

/// An input file that was not turned into pages.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate counters and timings for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Image files found in the input directory.
    pub images_found: usize,
    /// Images that produced at least one page.
    pub images_processed: usize,
    /// Images skipped because they could not be decoded.
    pub images_skipped: usize,
    /// Pages in the output document.
    pub pages_written: usize,
    /// Pages whose OCR call failed and were written image-only.
    pub ocr_failures: usize,
    pub total_duration_ms: u64,
    /// Time spent inside the OCR engine.
    pub ocr_duration_ms: u64,
}

/// Dry-run description of one input image (see [`crate::convert::inspect`]).
#[derive(Debug, Clone, Serialize)]
pub struct ImagePlan {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Planned slices, or empty when the image is unusable.
    pub slices: Vec<Slice>,
    /// Why the image would be skipped or abort the run.
    pub error: Option<String>,
}
