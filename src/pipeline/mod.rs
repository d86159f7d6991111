//! Pipeline stages for image-folder-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ order ──▶ slice ──▶ ocr ──▶ render ──▶ document
//! (list)   (sort)    (crop)   (text)  (layout)   (append)
//! ```
//!
//! 1. [`input`]  — list image files in the input directory by extension
//! 2. [`order`]  — sort them by creation timestamp (stable)
//! 3. [`slice`]  — cut each image into page-ratio strips
//! 4. [`ocr`]    — optionally recognise each strip's text; cleaned by
//!    [`postprocess`]
//! 5. [`render`] — lay the strip out full-bleed and attach the text layer;
//!    pixels are packed by [`encode`]
//!
//! The resulting pages go to [`crate::document::PdfDocumentWriter`].

pub mod encode;
pub mod input;
pub mod ocr;
pub mod order;
pub mod postprocess;
pub mod render;
pub mod slice;
