//! Turning content entries into pages.
//!
//! The [`PageMaterializer`] trait is the seam between the compiler and the
//! page container format. The production implementation,
//! [`LopdfMaterializer`], loads PDFs with `lopdf` and renders images through
//! [`crate::imaging`]. Tests substitute a mock that fabricates blank pages.
//!
//! A failure here is never fatal to a compile: the entry keeps zero pages and
//! gets no outline node.

use crate::describe::{Entry, EntryKind};
use crate::imaging::{
    DEFAULT_JPEG_QUALITY, PageSize, RenderError, RenderParams, render_image_document,
};
use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Cannot read PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Cannot render image: {0}")]
    Render(#[from] RenderError),
    #[error("Not a content entry: {0}")]
    NotContent(PathBuf),
}

/// Pages produced for one content entry, held as a standalone document.
#[derive(Debug, Clone)]
pub struct Pages {
    document: Document,
}

impl Pages {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// A document of `count` empty pages of `width` × `height` points.
    pub fn blank(count: usize, width: f32, height: f32) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            Content { operations: vec![] }.encode().unwrap_or_default(),
        ));

        let kids: Vec<Object> = (0..count)
            .map(|_| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Contents" => content_id,
                    "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
                })
                .into()
            })
            .collect();

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Self { document: doc }
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// Produces the pages of a content entry.
///
/// Implementations must be `Sync`: entries are materialized in parallel.
pub trait PageMaterializer: Sync {
    fn materialize(&self, entry: &Entry) -> Result<Pages, MaterializeError>;
}

/// Production materializer: `lopdf` for PDFs, [`crate::imaging`] for images.
#[derive(Debug, Clone, Copy)]
pub struct LopdfMaterializer {
    page: PageSize,
    dpi: u32,
    jpeg_quality: u8,
}

impl LopdfMaterializer {
    /// `dpi` is the compile-wide resolution; a folder `.dpi` overrides it.
    pub fn new(page: PageSize, dpi: u32) -> Self {
        Self {
            page,
            dpi,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Render parameters for an image entry.
    pub fn render_params(&self, entry: &Entry) -> RenderParams {
        RenderParams {
            jpeg_quality: self.jpeg_quality,
            ..RenderParams::new(self.page, entry.resolution.unwrap_or(self.dpi))
        }
    }
}

impl PageMaterializer for LopdfMaterializer {
    fn materialize(&self, entry: &Entry) -> Result<Pages, MaterializeError> {
        match entry.kind {
            EntryKind::Pdf => Ok(Pages::new(Document::load(&entry.path)?)),
            EntryKind::Image => {
                let doc = render_image_document(&entry.path, &self.render_params(entry))?;
                Ok(Pages::new(doc))
            }
            EntryKind::Folder => Err(MaterializeError::NotContent(entry.path.clone())),
        }
    }
}
