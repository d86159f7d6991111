//! Slicing: cut a tall image into page-ratio vertical strips.
//!
//! Long screenshots and scrolled captures are far taller than a page. Drawn
//! whole, they would shrink to an unreadable column. Instead each image is
//! cut into strips whose height/width ratio matches the page, so every strip
//! fills its page edge to edge.
//!
//! ```text
//!   W px
//! ┌──────┐  ─┐
//! │      │   │ S = floor(W · R)
//! │  0   │   │
//! ├──────┤  ─┘
//! │  1   │
//! ├──────┤
//! │  2   │  last strip: H - 2S rows
//! └──────┘
//! ```

use crate::error::Img2PdfError;
use image::DynamicImage;
use serde::Serialize;

/// A horizontal strip `[top, bottom)` of an image, full width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slice {
    /// 0-based position within its image.
    pub index: usize,
    /// First pixel row (inclusive).
    pub top: u32,
    /// Last pixel row (exclusive).
    pub bottom: u32,
    /// Width of the source image.
    pub width: u32,
}

impl Slice {
    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Slice height in pixels for an image `width` × `height` at page ratio `ratio`.
///
/// `floor(width * ratio)`, or `height` when that is not positive, clamped to
/// `1..=height`. Returns `0` only when `height` is `0`.
pub fn slice_height(width: u32, height: u32, ratio: f64) -> u32 {
    let raw = (f64::from(width) * ratio).floor();
    let s = if raw.is_finite() && raw > 0.0 {
        // Saturating cast: anything past u32::MAX is clamped below anyway.
        raw as u32
    } else {
        height
    };
    s.clamp(1.min(height), height)
}

/// Plan the strips for an image `width` × `height`.
///
/// Produces `ceil(height / S)` contiguous, non-overlapping slices covering
/// every row exactly once; only the last may be shorter than `S`.
///
/// # Errors
/// [`Img2PdfError::DegenerateImage`] when either dimension is zero.
pub fn plan_slices(width: u32, height: u32, ratio: f64) -> Result<Vec<Slice>, Img2PdfError> {
    ensure_non_degenerate(width, height)?;

    let s = slice_height(width, height, ratio);
    let count = height.div_ceil(s);

    Ok((0..count)
        .map(|i| {
            let top = i * s;
            Slice {
                index: i as usize,
                top,
                bottom: top.saturating_add(s).min(height),
                width,
            }
        })
        .collect())
}

/// A single slice covering the whole image (slicing disabled).
pub fn whole_image(width: u32, height: u32) -> Result<Vec<Slice>, Img2PdfError> {
    ensure_non_degenerate(width, height)?;
    Ok(vec![Slice {
        index: 0,
        top: 0,
        bottom: height,
        width,
    }])
}

/// Crop one planned slice out of `img`.
pub fn crop(img: &DynamicImage, slice: &Slice) -> DynamicImage {
    img.crop_imm(0, slice.top, slice.width, slice.height())
}

fn ensure_non_degenerate(width: u32, height: u32) -> Result<(), Img2PdfError> {
    if width == 0 || height == 0 {
        return Err(Img2PdfError::DegenerateImage { width, height });
    }
    Ok(())
}
