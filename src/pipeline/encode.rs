//! Image encoding: `DynamicImage` → bytes for the two consumers of a slice.
//!
//! * The PDF page embeds the slice as a raw 8-bit DeviceRGB image XObject.
//!   The stream is left unfiltered here and Flate-compressed when the
//!   document is finalized, so the image stays lossless.
//! * The OCR engine receives the slice as a PNG file. PNG is lossless, and
//!   JPEG artefacts around glyph edges hurt recognition accuracy.

use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Pixel data for one page image, ready to become a PDF image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB triplets, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

/// Convert a slice to packed RGB8 for embedding.
///
/// Alpha is dropped (PDF image XObjects without an SMask are opaque), which
/// matches converting the source to RGB before slicing.
pub fn encode_xobject(img: &DynamicImage) -> ImageXObject {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let data = rgb.into_raw();
    debug!("Encoded slice → {}x{} RGB ({} bytes)", width, height, data.len());
    ImageXObject {
        width,
        height,
        rgb: data,
    }
}

/// Encode a slice as PNG bytes for the OCR engine.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded slice → {} bytes PNG", buf.len());
    Ok(buf)
}
