//! Input listing: enumerate the image files of the input directory.
//!
//! Only regular files whose lowercased extension is in [`IMAGE_EXTENSIONS`]
//! are kept. Subdirectories are not descended into. Entries are returned
//! sorted by file name so the stable tie-break of the time sorter does not
//! depend on the filesystem's `read_dir` order.

use crate::error::Img2PdfError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Recognised image extensions (compared lowercased).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "bmp", "webp"];

/// One listed input image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageFile {
    /// Full path of the file.
    pub path: PathBuf,
    /// File name without directory, for logs and progress output.
    pub file_name: String,
    /// Lowercased extension.
    pub extension: String,
    /// Ordering timestamp, filled in by [`crate::pipeline::order`].
    #[serde(skip)]
    pub timestamp: Option<SystemTime>,
}

impl ImageFile {
    /// Build an `ImageFile` if `path` has a recognised image extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let extension = image_extension(&path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some(Self {
            path,
            file_name,
            extension,
            timestamp: None,
        })
    }
}

/// Lowercased extension of `path` if it is in the allow-list.
pub fn image_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// List the image files directly inside `dir`.
///
/// # Errors
/// - [`Img2PdfError::InputDirNotFound`] if `dir` does not exist
/// - [`Img2PdfError::NotADirectory`] if `dir` is a file
/// - [`Img2PdfError::PermissionDenied`] / [`Img2PdfError::ReadDirFailed`]
///   if the directory cannot be read
pub fn list_images(dir: &Path) -> Result<Vec<ImageFile>, Img2PdfError> {
    if !dir.exists() {
        return Err(Img2PdfError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(Img2PdfError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| Img2PdfError::from_io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Img2PdfError::ReadDirFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match ImageFile::from_path(path) {
            Some(file) => files.push(file),
            None => debug!("Ignoring non-image entry: {}", entry.path().display()),
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    debug!("Listed {} image(s) in {}", files.len(), dir.display());
    Ok(files)
}
