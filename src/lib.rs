//! # edgequake-img2pdf
//!
//! Convert a folder of images into a single PDF, optionally searchable.
//!
//! ## Why this crate?
//!
//! Phone scans, long screenshots and exported slides pile up as loose image
//! files. This crate turns a directory of them into one document:
//!
//! * pages follow the order in which the files were **created**, not their
//!   names, so camera-roll style names (`IMG_2041.jpg`) still come out in
//!   capture order;
//! * images taller than a page are **sliced** into page-ratio strips instead
//!   of being shrunk into an unreadable column;
//! * with OCR enabled, every page gets a **searchable text layer** that is
//!   invisible on screen and in print but can still be selected and searched.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input_images/
//!  │
//!  ├─ 1. Input   list png/jpg/jpeg/tiff/bmp/webp files
//!  ├─ 2. Order   sort by creation time (stable)
//!  ├─ 3. Slice   cut into page-ratio strips
//!  ├─ 4. OCR     tesseract per strip (optional, failures are non-fatal)
//!  ├─ 5. Render  full-bleed image + hidden text layer
//!  └─ 6. Write   append pages, finalize once → output.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_img2pdf::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .input_dir("input_images")
//!         .output_path("output_pdf/course_material_ocr.pdf")
//!         .ocr_overlay(true)
//!         .build()?;
//!     let output = convert(&config)?;
//!     eprintln!("{} pages written", output.stats.pages_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-img2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, DecodePolicy, FileOrder, OverlayMode, PageSize,
    Variant,
};
pub use convert::{convert, convert_with, inspect};
pub use document::PdfDocumentWriter;
pub use error::{Img2PdfError, OcrError};
pub use output::{ConversionOutput, ConversionStats, ImagePlan, PageRecord, SkippedImage};
pub use pipeline::input::{list_images, ImageFile, IMAGE_EXTENSIONS};
pub use pipeline::ocr::{OcrEngine, TesseractCli};
pub use pipeline::order::{sort_by_timestamp, CreationTime, ModificationTime, TimestampSource};
pub use pipeline::slice::{plan_slices, Slice};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
