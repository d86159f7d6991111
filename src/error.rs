//! Error types for the edgequake-img2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Img2PdfError`] — **Fatal**: the run cannot continue (missing input
//!   directory, unwritable output, undecodable image under the default
//!   abort policy). Returned as `Err(Img2PdfError)` from the top-level
//!   `convert*` functions.
//!
//! * [`OcrError`] — **Non-fatal**: text extraction failed for one slice.
//!   The image layer of that page is still valid output, so the page is
//!   written with an empty text layer and the failure is counted in
//!   [`crate::output::ConversionStats::ocr_failures`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-img2pdf library.
#[derive(Debug, Error)]
pub enum Img2PdfError {
    // ── Filesystem errors ─────────────────────────────────────────────────
    /// Input directory was not found at the given path.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputDirNotFound { path: PathBuf },

    /// The input path exists but is a file, not a directory.
    #[error("Input path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// Process does not have read permission on the path.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Listing the input directory failed part-way.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File metadata (timestamps) could not be read.
    #[error("Failed to read metadata for '{path}': {source}")]
    MetadataFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run produced no pages: the directory held no decodable images.
    #[error("No usable images in '{path}' ({found} image file(s) found)\nRecognised extensions: png, jpg, jpeg, tiff, bmp, webp.")]
    NoUsableImages { path: PathBuf, found: usize },

    // ── Image errors ──────────────────────────────────────────────────────
    /// A listed file could not be decoded as an image.
    #[error("Failed to decode image '{path}': {source}")]
    ImageDecodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image has a zero dimension and cannot be laid out on a page.
    #[error("Degenerate image ({width}x{height} px): width and height must both be non-zero")]
    DegenerateImage { width: u32, height: u32 },

    // ── Document errors ───────────────────────────────────────────────────
    /// A page was appended (or finalize called) after the document was finalized.
    #[error("Document already finalized; no further pages can be appended")]
    DocumentFinalized,

    /// lopdf failed to encode a content stream or serialise the document.
    #[error("PDF encoding failed: {0}")]
    PdfEncodeFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Img2PdfError {
    /// Error class name printed by the CLI as `error[<class>]`.
    pub fn class(&self) -> &'static str {
        match self {
            Img2PdfError::InputDirNotFound { .. }
            | Img2PdfError::NotADirectory { .. }
            | Img2PdfError::PermissionDenied { .. }
            | Img2PdfError::ReadDirFailed { .. }
            | Img2PdfError::MetadataFailed { .. }
            | Img2PdfError::OutputWriteFailed { .. } => "FilesystemError",
            Img2PdfError::NoUsableImages { found: 0, .. } => "FilesystemError",
            Img2PdfError::NoUsableImages { .. } => "ImageDecodeError",
            Img2PdfError::ImageDecodeFailed { .. } => "ImageDecodeError",
            Img2PdfError::DegenerateImage { .. } => "DegenerateImageError",
            Img2PdfError::DocumentFinalized | Img2PdfError::PdfEncodeFailed(_) => "DocumentError",
            Img2PdfError::InvalidConfig(_) => "ConfigError",
        }
    }

    /// Map an I/O error on `path` to the closest filesystem variant.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Img2PdfError::InputDirNotFound { path },
            std::io::ErrorKind::PermissionDenied => Img2PdfError::PermissionDenied { path },
            _ => Img2PdfError::ReadDirFailed { path, source },
        }
    }
}

impl From<lopdf::Error> for Img2PdfError {
    fn from(e: lopdf::Error) -> Self {
        Img2PdfError::PdfEncodeFailed(e.to_string())
    }
}

/// A non-fatal OCR failure for a single slice.
///
/// The class name reported for these is always `OCRError`.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR executable could not be spawned.
    #[error("OCR engine '{binary}' not found on PATH\nInstall tesseract or pass --tesseract <PATH>.")]
    EngineNotFound { binary: String },

    /// The OCR process ran but exited unsuccessfully.
    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// Scratch-file I/O around the OCR call failed.
    #[error("OCR scratch I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The slice could not be encoded for the OCR engine.
    #[error("Failed to encode slice for OCR: {0}")]
    Encode(#[from] image::ImageError),
}
