//! Page layout: place a slice on the page and attach its text layer.
//!
//! PDF user space has its origin at the **bottom-left** corner with Y
//! growing upward. Slices are scaled to the largest size that fits the page
//! without distortion and anchored at that corner. Slices cut at the page
//! ratio therefore fill the page exactly, and the short final strip of an
//! image sits at the bottom with blank space above it.
//!
//! The overlay text starts `overlay_margin` points in from the top-left
//! corner and runs downward, one OCR line per text line.

use crate::config::{ConversionConfig, OverlayMode, PageSize};
use crate::pipeline::encode::{encode_xobject, ImageXObject};
use crate::pipeline::postprocess::overlay_lines;
use image::DynamicImage;

/// Line spacing as a multiple of font size.
pub const LEADING_FACTOR: f32 = 1.2;

/// Axis-aligned rectangle in PDF points, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The searchable text drawn over a page image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    /// One entry per text line, top to bottom.
    pub lines: Vec<String>,
    /// Baseline origin of the first line.
    pub origin_x: f32,
    pub origin_y: f32,
    pub font_size: f32,
    /// Distance between consecutive baselines.
    pub leading: f32,
    pub mode: OverlayMode,
    /// Fill alpha for [`OverlayMode::Translucent`].
    pub opacity: f32,
}

/// One fully laid-out page, ready for [`crate::document::PdfDocumentWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub page_size: PageSize,
    pub image: ImageXObject,
    pub placement: Rect,
    pub overlay: Option<TextOverlay>,
}

/// Largest rectangle with the image's aspect ratio that fits `page`,
/// anchored at the bottom-left corner.
pub fn fit_rect(img_width: u32, img_height: u32, page: PageSize) -> Rect {
    if img_width == 0 || img_height == 0 {
        return Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
        };
    }
    let iw = img_width as f32;
    let ih = img_height as f32;
    let scale = (page.width / iw).min(page.height / ih);
    Rect {
        x: 0.0,
        y: 0.0,
        width: iw * scale,
        height: ih * scale,
    }
}

/// Build the text overlay for `text`, or `None` when there is nothing to draw.
pub fn build_overlay(text: &str, config: &ConversionConfig) -> Option<TextOverlay> {
    let lines = overlay_lines(text);
    if lines.is_empty() {
        return None;
    }
    let font_size = config.overlay_font_size as f32;
    Some(TextOverlay {
        lines,
        origin_x: config.overlay_margin,
        origin_y: config.page_size.height - config.overlay_margin,
        font_size,
        leading: font_size * LEADING_FACTOR,
        mode: config.overlay_mode,
        opacity: config.overlay_opacity,
    })
}

/// Lay out one slice as a full page.
///
/// `ocr_text` is `None` when OCR is disabled or failed; the page is then
/// image-only.
pub fn render_page(
    slice: &DynamicImage,
    ocr_text: Option<&str>,
    config: &ConversionConfig,
) -> PageContent {
    let image = encode_xobject(slice);
    let placement = fit_rect(image.width, image.height, config.page_size);
    let overlay = ocr_text.and_then(|t| build_overlay(t, config));
    PageContent {
        page_size: config.page_size,
        image,
        placement,
        overlay,
    }
}
