//! Configuration types for image-folder-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Every path, page dimension and
//! overlay parameter lives here instead of in module-level constants, so two
//! runs can be compared by diffing their configs.

use crate::error::Img2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Points per inch in PDF user space.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Configuration for one conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_img2pdf::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .input_dir("scans")
///     .output_path("out/scans.pdf")
///     .page_size(PageSize::LETTER)
///     .ocr_overlay(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory scanned for input images. Default: `input_images`.
    pub input_dir: PathBuf,

    /// Path of the PDF written at the end of the run. Default: `output_pdf/output.pdf`.
    ///
    /// Parent directories are created when the document is finalized.
    pub output_path: PathBuf,

    /// Output page size in points. Default: [`PageSize::A4`].
    ///
    /// Its height/width ratio is also the target ratio for slicing.
    pub page_size: PageSize,

    /// Split tall images into page-ratio strips. Default: true.
    ///
    /// When false each image becomes exactly one page, scaled to fit.
    pub slicing: bool,

    /// Run OCR on every page and embed the text as a searchable layer. Default: false.
    pub ocr_overlay: bool,

    /// Fill opacity of the overlay text in `[0, 1]`. Default: 0.01.
    ///
    /// Only used with [`OverlayMode::Translucent`].
    pub overlay_opacity: f32,

    /// Overlay font size in points. Default: 8.
    pub overlay_font_size: u32,

    /// Distance of the overlay origin from the top-left page corner, in points. Default: 36 (½ inch).
    pub overlay_margin: f32,

    /// How the searchable text layer is kept out of sight. Default: [`OverlayMode::Translucent`].
    pub overlay_mode: OverlayMode,

    /// Tesseract language code(s), e.g. `eng` or `eng+deu`. Default: `eng`.
    pub ocr_language: String,

    /// Tesseract executable. Default: `tesseract` (resolved on PATH).
    pub tesseract_binary: String,

    /// Page sequence policy. Default: [`FileOrder::CreationTime`].
    pub file_order: FileOrder,

    /// What to do with files that fail to decode. Default: [`DecodePolicy::Abort`].
    pub on_decode_error: DecodePolicy,

    /// Optional progress callback for per-image events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_images"),
            output_path: PathBuf::from("output_pdf/output.pdf"),
            page_size: PageSize::A4,
            slicing: true,
            ocr_overlay: false,
            overlay_opacity: 0.01,
            overlay_font_size: 8,
            overlay_margin: 0.5 * POINTS_PER_INCH,
            overlay_mode: OverlayMode::default(),
            ocr_language: "eng".to_string(),
            tesseract_binary: "tesseract".to_string(),
            file_order: FileOrder::default(),
            on_decode_error: DecodePolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("input_dir", &self.input_dir)
            .field("output_path", &self.output_path)
            .field("page_size", &self.page_size)
            .field("slicing", &self.slicing)
            .field("ocr_overlay", &self.ocr_overlay)
            .field("overlay_opacity", &self.overlay_opacity)
            .field("overlay_font_size", &self.overlay_font_size)
            .field("overlay_margin", &self.overlay_margin)
            .field("overlay_mode", &self.overlay_mode)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_binary", &self.tesseract_binary)
            .field("file_order", &self.file_order)
            .field("on_decode_error", &self.on_decode_error)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Target slice ratio: page height divided by page width.
    pub fn aspect_ratio(&self) -> f64 {
        self.page_size.aspect_ratio()
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn slicing(mut self, v: bool) -> Self {
        self.config.slicing = v;
        self
    }

    pub fn ocr_overlay(mut self, v: bool) -> Self {
        self.config.ocr_overlay = v;
        self
    }

    /// Apply one of the preset [`Variant`]s (sets `slicing` and `ocr_overlay`).
    pub fn variant(mut self, variant: Variant) -> Self {
        let (slicing, ocr) = variant.flags();
        self.config.slicing = slicing;
        self.config.ocr_overlay = ocr;
        self
    }

    pub fn overlay_opacity(mut self, opacity: f32) -> Self {
        self.config.overlay_opacity = opacity;
        self
    }

    pub fn overlay_font_size(mut self, size: u32) -> Self {
        self.config.overlay_font_size = size;
        self
    }

    pub fn overlay_margin(mut self, points: f32) -> Self {
        self.config.overlay_margin = points.max(0.0);
        self
    }

    pub fn overlay_mode(mut self, mode: OverlayMode) -> Self {
        self.config.overlay_mode = mode;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn tesseract_binary(mut self, binary: impl Into<String>) -> Self {
        self.config.tesseract_binary = binary.into();
        self
    }

    pub fn file_order(mut self, order: FileOrder) -> Self {
        self.config.file_order = order;
        self
    }

    pub fn on_decode_error(mut self, policy: DecodePolicy) -> Self {
        self.config.on_decode_error = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Img2PdfError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.overlay_opacity) {
            return Err(Img2PdfError::InvalidConfig(format!(
                "Overlay opacity must be 0.0–1.0, got {}",
                c.overlay_opacity
            )));
        }
        if c.overlay_font_size == 0 {
            return Err(Img2PdfError::InvalidConfig(
                "Overlay font size must be ≥ 1".into(),
            ));
        }
        if !(c.page_size.width > 0.0 && c.page_size.height > 0.0) {
            return Err(Img2PdfError::InvalidConfig(format!(
                "Page size must be positive, got {}x{}",
                c.page_size.width, c.page_size.height
            )));
        }
        if c.input_dir.as_os_str().is_empty() {
            return Err(Img2PdfError::InvalidConfig(
                "Input directory must not be empty".into(),
            ));
        }
        if c.output_path.as_os_str().is_empty() {
            return Err(Img2PdfError::InvalidConfig(
                "Output path must not be empty".into(),
            ));
        }
        if c.ocr_overlay && c.ocr_language.trim().is_empty() {
            return Err(Img2PdfError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4, 210 × 297 mm (≈ 595 × 842 pt).
    pub const A4: PageSize = PageSize {
        width: 595.275_6,
        height: 841.889_8,
    };

    /// US Letter, 8.5 × 11 in.
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Height divided by width, in f64 so slice arithmetic stays exact for
    /// the rounding at `floor(W * R)`.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the OCR text layer is hidden from view while staying extractable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayMode {
    /// Filled text drawn with `overlay_opacity` alpha. (default)
    #[default]
    Translucent,
    /// PDF text render mode 3: glyphs are neither filled nor stroked.
    Invisible,
}

/// Which timestamp decides the page sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileOrder {
    /// File creation time, falling back to metadata-change time where the
    /// platform has no birth time. (default)
    #[default]
    CreationTime,
    /// Last modification time.
    ModifiedTime,
    /// Directory listing order (file name).
    Name,
}

/// Handling for listed files that cannot be decoded, or decode to a
/// zero-sized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DecodePolicy {
    /// Abort the whole run. (default)
    #[default]
    Abort,
    /// Log a warning, count the file as skipped, and continue.
    Skip,
}

/// Preset `{slicing, ocr_overlay}` combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Sliced pages, no text layer.
    ImageOnly,
    /// Sliced pages, each with its own OCR text layer.
    SlicedOcr,
    /// One page per image, OCR text layer at the top margin.
    WholeImageOcr,
}

impl Variant {
    /// `(slicing, ocr_overlay)` for this preset.
    pub fn flags(self) -> (bool, bool) {
        match self {
            Variant::ImageOnly => (true, false),
            Variant::SlicedOcr => (true, true),
            Variant::WholeImageOcr => (false, true),
        }
    }
}
