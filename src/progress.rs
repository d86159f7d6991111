//! Progress-callback trait for per-image conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each image. The CLI uses this to drive
//! its progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_img2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for PageCounter {
//!     fn on_image_complete(&self, _index: usize, _total: usize, pages: usize) {
//!         self.pages.fetch_add(pages, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each image.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Image indices are 1-based.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the input directory has been listed and ordered.
    fn on_conversion_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called before an image is decoded.
    fn on_image_start(&self, index: usize, total_images: usize, file_name: &str) {
        let _ = (index, total_images, file_name);
    }

    /// Called after all pages of an image have been appended.
    fn on_image_complete(&self, index: usize, total_images: usize, pages: usize) {
        let _ = (index, total_images, pages);
    }

    /// Called when an image is skipped under [`crate::config::DecodePolicy::Skip`].
    fn on_image_error(&self, index: usize, total_images: usize, error: &str) {
        let _ = (index, total_images, error);
    }

    /// Called once after the document has been finalized.
    fn on_conversion_complete(&self, total_images: usize, total_pages: usize) {
        let _ = (total_images, total_pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
