//! Page sequencing: order listed images by a filesystem timestamp.
//!
//! Scans and screenshots rarely carry their page number in the file name, so
//! the intended sequence is recovered from when each file was created. The
//! timestamp lookup is behind [`TimestampSource`] so platform differences
//! stay in one place and tests can inject fake times.
//!
//! ## Known limitation
//!
//! Linux filesystems only expose a birth time through `statx`, and not all
//! of them record it. Where [`std::fs::Metadata::created`] is unavailable
//! [`CreationTime`] falls back to the inode change time (`ctime`), which is
//! bumped by renames, `chmod` and copies. Files touched after creation can
//! therefore sort out of their original order. This is accepted rather than
//! guessed around; use [`crate::config::FileOrder::Name`] when file names
//! already encode the order.

use crate::config::FileOrder;
use crate::error::Img2PdfError;
use crate::pipeline::input::ImageFile;
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Maps a file path to the timestamp used to order it.
///
/// Implemented for any `Fn(&Path) -> Result<SystemTime, Img2PdfError>`.
pub trait TimestampSource {
    fn timestamp(&self, path: &Path) -> Result<SystemTime, Img2PdfError>;
}

impl<F> TimestampSource for F
where
    F: Fn(&Path) -> Result<SystemTime, Img2PdfError>,
{
    fn timestamp(&self, path: &Path) -> Result<SystemTime, Img2PdfError> {
        self(path)
    }
}

/// True creation time where available, else metadata-change time.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreationTime;

impl TimestampSource for CreationTime {
    fn timestamp(&self, path: &Path) -> Result<SystemTime, Img2PdfError> {
        let meta = read_metadata(path)?;
        match meta.created() {
            Ok(t) => Ok(t),
            Err(_) => change_time(&meta).or_else(|_| modified(path, &meta)),
        }
    }
}

/// Last-modification time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModificationTime;

impl TimestampSource for ModificationTime {
    fn timestamp(&self, path: &Path) -> Result<SystemTime, Img2PdfError> {
        let meta = read_metadata(path)?;
        modified(path, &meta)
    }
}

/// Resolve the timestamp source for `order`, or `None` for name order.
pub fn source_for(order: FileOrder) -> Option<Box<dyn TimestampSource>> {
    match order {
        FileOrder::CreationTime => Some(Box::new(CreationTime)),
        FileOrder::ModifiedTime => Some(Box::new(ModificationTime)),
        FileOrder::Name => None,
    }
}

/// Sort `files` ascending by timestamp.
///
/// The sort is stable: files with equal timestamps keep their listing order.
/// Each file's `timestamp` field is filled in.
pub fn sort_by_timestamp(
    mut files: Vec<ImageFile>,
    source: &dyn TimestampSource,
) -> Result<Vec<ImageFile>, Img2PdfError> {
    for file in &mut files {
        file.timestamp = Some(source.timestamp(&file.path)?);
    }
    files.sort_by_key(|f| f.timestamp);

    for (i, f) in files.iter().enumerate() {
        debug!("Order {:>3}: {}", i + 1, f.file_name);
    }
    Ok(files)
}

fn read_metadata(path: &Path) -> Result<Metadata, Img2PdfError> {
    std::fs::metadata(path).map_err(|e| Img2PdfError::MetadataFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn modified(path: &Path, meta: &Metadata) -> Result<SystemTime, Img2PdfError> {
    meta.modified().map_err(|e| Img2PdfError::MetadataFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(unix)]
fn change_time(meta: &Metadata) -> Result<SystemTime, std::io::Error> {
    use std::os::unix::fs::MetadataExt;
    use std::time::Duration;

    let secs = meta.ctime();
    let nanos = meta.ctime_nsec().clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        Ok(SystemTime::UNIX_EPOCH + Duration::new(secs as u64, nanos))
    } else {
        Ok(SystemTime::UNIX_EPOCH - Duration::new(secs.unsigned_abs(), 0))
    }
}

#[cfg(not(unix))]
fn change_time(_meta: &Metadata) -> Result<SystemTime, std::io::Error> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "metadata-change time not exposed on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn file(name: &str) -> ImageFile {
        ImageFile::from_path(PathBuf::from("/in").join(name)).unwrap()
    }

    fn fake_times(times: &[(&str, u64)]) -> impl Fn(&Path) -> Result<SystemTime, Img2PdfError> {
        let map: HashMap<PathBuf, SystemTime> = times
            .iter()
            .map(|(n, s)| {
                (
                    PathBuf::from("/in").join(n),
                    SystemTime::UNIX_EPOCH + Duration::from_secs(*s),
                )
            })
            .collect();
        move |p: &Path| {
            map.get(p).copied().ok_or_else(|| Img2PdfError::MetadataFailed {
                path: p.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no fake time"),
            })
        }
    }

    fn order(files: &[ImageFile]) -> Vec<&str> {
        files.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn distinct_timestamps_sort_ascending() {
        let source = fake_times(&[("x.png", 30), ("y.png", 10), ("z.png", 20)]);
        let sorted =
            sort_by_timestamp(vec![file("x.png"), file("y.png"), file("z.png")], &source).unwrap();
        assert_eq!(order(&sorted), vec!["y.png", "z.png", "x.png"]);
        assert!(sorted.iter().all(|f| f.timestamp.is_some()));
    }

    #[test]
    fn equal_timestamps_keep_listing_order() {
        let source = fake_times(&[("c.png", 5), ("a.png", 5), ("b.png", 5), ("first.png", 1)]);
        let listed = vec![file("c.png"), file("a.png"), file("b.png"), file("first.png")];
        let sorted = sort_by_timestamp(listed, &source).unwrap();
        assert_eq!(order(&sorted), vec!["first.png", "c.png", "a.png", "b.png"]);
    }

    #[test]
    fn sorting_is_idempotent() {
        let source = fake_times(&[("a.png", 2), ("b.png", 1), ("c.png", 2)]);
        let once = sort_by_timestamp(vec![file("a.png"), file("b.png"), file("c.png")], &source)
            .unwrap();
        let twice = sort_by_timestamp(once.clone(), &source).unwrap();
        assert_eq!(order(&once), order(&twice));
    }

    #[test]
    fn timestamp_failure_propagates() {
        let source = fake_times(&[("a.png", 1)]);
        let err = sort_by_timestamp(vec![file("a.png"), file("missing.png")], &source).unwrap_err();
        assert!(matches!(err, Img2PdfError::MetadataFailed { .. }));
    }

    #[test]
    fn real_sources_read_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.png");
        std::fs::write(&p, b"x").unwrap();
        assert!(CreationTime.timestamp(&p).is_ok());
        assert!(ModificationTime.timestamp(&p).is_ok());
        assert!(CreationTime.timestamp(&dir.path().join("nope.png")).is_err());
    }

    #[test]
    fn name_order_has_no_source() {
        assert!(source_for(FileOrder::Name).is_none());
        assert!(source_for(FileOrder::CreationTime).is_some());
    }
}
