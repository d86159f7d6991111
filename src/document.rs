//! The output PDF: an append-only page sequence finalized exactly once.
//!
//! ```text
//!   new() ──▶ Open ──append_page()──▶ Open ──finalize()──▶ Finalized
//!                                                            │
//!                          append_page() / finalize() ──▶ Err(DocumentFinalized)
//! ```
//!
//! Nothing reaches the filesystem until [`PdfDocumentWriter::finalize`]. A
//! writer dropped while still open discards its pages; this is logged at
//! `warn` level because it means a run ended without producing output.

use crate::config::OverlayMode;
use crate::error::Img2PdfError;
use crate::pipeline::render::{PageContent, TextOverlay};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PRODUCER: &str = concat!("edgequake-img2pdf ", env!("CARGO_PKG_VERSION"));

const IMAGE_NAME: &str = "Im0";
const FONT_NAME: &str = "F1";
const GSTATE_NAME: &str = "GS0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Open,
    Finalized,
}

/// Builds a PDF one page at a time and writes it once at the end.
pub struct PdfDocumentWriter {
    output_path: PathBuf,
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
    state: WriterState,
}

impl PdfDocumentWriter {
    /// Open an empty document that will be written to `output_path`.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            output_path: output_path.into(),
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
            state: WriterState::Open,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.state == WriterState::Finalized
    }

    /// Check that the output location can be written, before any page work.
    ///
    /// Creates missing parent directories and briefly creates the scratch
    /// `*.pdf.tmp` file that [`finalize`](Self::finalize) will write.
    ///
    /// # Errors
    /// [`Img2PdfError::OutputWriteFailed`] if the path is a directory or the
    /// scratch file cannot be created.
    pub fn check_output(&self) -> Result<(), Img2PdfError> {
        let path = self.output_path.as_path();
        let write_err = |source| Img2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if path.is_dir() {
            return Err(write_err(std::io::Error::new(
                std::io::ErrorKind::IsADirectory,
                "output path is a directory",
            )));
        }
        create_parent_dirs(path).map_err(write_err)?;
        let tmp_path = scratch_path(path);
        std::fs::File::create(&tmp_path).map_err(write_err)?;
        std::fs::remove_file(&tmp_path).map_err(write_err)?;
        debug!("Output location {} is writable", path.display());
        Ok(())
    }

    /// Append one page and return its 1-based page number.
    ///
    /// # Errors
    /// [`Img2PdfError::DocumentFinalized`] after [`finalize`](Self::finalize).
    pub fn append_page(&mut self, page: &PageContent) -> Result<usize, Img2PdfError> {
        if self.state == WriterState::Finalized {
            return Err(Img2PdfError::DocumentFinalized);
        }

        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(page.image.width),
                "Height" => i64::from(page.image.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            page.image.rgb.clone(),
        ));

        let mut resources = dictionary! {
            "XObject" => dictionary! { IMAGE_NAME => image_id },
        };

        let mut operations = image_operations(page);
        if let Some(ref overlay) = page.overlay {
            resources.set("Font", dictionary! { FONT_NAME => self.font_id });
            if overlay.mode == OverlayMode::Translucent {
                resources.set(
                    "ExtGState",
                    dictionary! {
                        GSTATE_NAME => dictionary! {
                            "Type" => "ExtGState",
                            "ca" => overlay.opacity,
                            "CA" => overlay.opacity,
                        },
                    },
                );
            }
            operations.extend(overlay_operations(overlay));
        }

        let content = Content { operations };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let media_box: Vec<Object> = vec![
            0.into(),
            0.into(),
            page.page_size.width.into(),
            page.page_size.height.into(),
        ];
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Resources" => resources,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);

        let page_num = self.page_ids.len();
        debug!(
            "Appended page {} ({}x{} px, overlay: {})",
            page_num,
            page.image.width,
            page.image.height,
            page.overlay.as_ref().map_or(0, |o| o.lines.len())
        );
        Ok(page_num)
    }

    /// Serialise the document and write it to the output path.
    ///
    /// The file is written to a sibling `*.tmp` path and renamed into place
    /// so an interrupted write never leaves a truncated PDF behind. Parent
    /// directories are created as needed. Returns the number of pages.
    ///
    /// # Errors
    /// - [`Img2PdfError::DocumentFinalized`] if called twice
    /// - [`Img2PdfError::OutputWriteFailed`] if the file cannot be written
    pub fn finalize(&mut self) -> Result<usize, Img2PdfError> {
        if self.state == WriterState::Finalized {
            return Err(Img2PdfError::DocumentFinalized);
        }
        // No transition back, even if the write below fails.
        self.state = WriterState::Finalized;

        let bytes = self.encode()?;
        let path = self.output_path.clone();
        write_atomic(&path, &bytes)?;

        // Release page data; the writer is inert from here on.
        self.doc = Document::with_version("1.5");
        info!(
            "Wrote {} page(s) ({} bytes) to {}",
            self.page_ids.len(),
            bytes.len(),
            path.display()
        );
        Ok(self.page_ids.len())
    }

    fn encode(&mut self) -> Result<Vec<u8>, Img2PdfError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        self.doc.compress();

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| Img2PdfError::PdfEncodeFailed(e.to_string()))?;
        Ok(out)
    }
}

impl Drop for PdfDocumentWriter {
    fn drop(&mut self) {
        if self.state == WriterState::Open && !self.page_ids.is_empty() {
            warn!(
                "PDF writer for {} dropped without finalize; {} page(s) discarded",
                self.output_path.display(),
                self.page_ids.len()
            );
        }
    }
}

// ── Content stream ───────────────────────────────────────────────────────

/// `q  w 0 0 h x y cm  /Im0 Do  Q`
fn image_operations(page: &PageContent) -> Vec<Operation> {
    let r = page.placement;
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                r.width.into(),
                0.into(),
                0.into(),
                r.height.into(),
                r.x.into(),
                r.y.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// One `BT … ET` block; the first line at the origin, then `T*` per line.
fn overlay_operations(overlay: &TextOverlay) -> Vec<Operation> {
    let mut ops = vec![Operation::new("q", vec![])];
    if overlay.mode == OverlayMode::Translucent {
        ops.push(Operation::new(
            "gs",
            vec![Object::Name(GSTATE_NAME.as_bytes().to_vec())],
        ));
    }
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![
            Object::Name(FONT_NAME.as_bytes().to_vec()),
            overlay.font_size.into(),
        ],
    ));
    ops.push(Operation::new("TL", vec![overlay.leading.into()]));
    if overlay.mode == OverlayMode::Invisible {
        ops.push(Operation::new("Tr", vec![3.into()]));
    }
    ops.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
    ops.push(Operation::new(
        "Td",
        vec![overlay.origin_x.into(), overlay.origin_y.into()],
    ));
    for (i, line) in overlay.lines.iter().enumerate() {
        if i > 0 {
            ops.push(Operation::new("T*", vec![]));
        }
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
        ));
    }
    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Encode `s` for a WinAnsiEncoding standard font; unmappable chars become `?`.
pub(crate) fn encode_win_ansi(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

fn scratch_path(path: &Path) -> PathBuf {
    path.with_extension("pdf.tmp")
}

fn create_parent_dirs(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => std::fs::create_dir_all(parent),
        None => Ok(()),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Img2PdfError> {
    let write_err = |source| Img2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    create_parent_dirs(path).map_err(write_err)?;
    let tmp_path = scratch_path(path);
    std::fs::write(&tmp_path, bytes).map_err(write_err)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        if let Err(cleanup) = std::fs::remove_file(&tmp_path) {
            warn!("Could not remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(write_err(e));
    }
    Ok(())
}
