//! Writing the compiled document.
//!
//! [`DocumentWriter`] is the output seam: pages go in by emission order,
//! outline items refer to pages by 0-based index, and `finish` writes the
//! file. [`PdfWriter`] is the `lopdf` implementation:
//!
//! ```text
//! append   renumber the source objects above ours, push inherited page
//!          attributes down, re-parent the pages under our page tree
//! outline  recorded in memory, validated against the pages appended so far
//! finish   /Pages, /Outlines, /Info and /Catalog objects, then save
//! ```
//!
//! The outline is built as plain dictionaries rather than through lopdf's
//! bookmark table so titles can be written as proper PDF text strings.

use crate::materialize::Pages;
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Outline target page {page} is past the last page ({total} pages)")]
    PageOutOfRange { page: usize, total: usize },
    #[error("Unknown outline parent #{0}")]
    UnknownParent(usize),
}

/// Attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Document information fields. Absent values are omitted from the output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    #[serde(skip)]
    pub creator: Option<String>,
}

impl DocumentMetadata {
    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: DocumentMetadata) -> Self {
        Self {
            title: self.title.or(fallback.title),
            author: self.author.or(fallback.author),
            subject: self.subject.or(fallback.subject),
            keywords: self.keywords.or(fallback.keywords),
            creator: self.creator.or(fallback.creator),
        }
    }
}

/// Opaque reference to an outline item created by a [`DocumentWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutlineHandle(pub usize);

pub trait DocumentWriter {
    /// Append pages at the end of the document. Returns how many were added.
    fn append(&mut self, pages: Pages) -> Result<usize, WriterError>;

    /// Add an outline item pointing at a 0-based page.
    fn add_outline(
        &mut self,
        title: &str,
        target_page: usize,
        parent: Option<OutlineHandle>,
    ) -> Result<OutlineHandle, WriterError>;

    fn set_metadata(&mut self, metadata: &DocumentMetadata);

    /// Write the document. Returns the path actually written.
    fn finish(&mut self, path: &Path) -> Result<PathBuf, WriterError>;
}

/// `path` with a `.pdf` extension, replacing any other extension.
pub fn pdf_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => path.to_path_buf(),
        _ => path.with_extension("pdf"),
    }
}

/// A PDF text string: literal for ASCII, UTF-16BE with byte order mark
/// otherwise.
pub fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[derive(Debug, Clone)]
struct OutlineItem {
    title: String,
    page: ObjectId,
    parent: Option<usize>,
}

/// `lopdf`-backed writer holding the whole output document in memory.
pub struct PdfWriter {
    document: Document,
    pages_id: ObjectId,
    pages: Vec<ObjectId>,
    outline: Vec<OutlineItem>,
    metadata: DocumentMetadata,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            pages: Vec::new(),
            outline: Vec::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn outline_objects(&mut self) -> Option<ObjectId> {
        if self.outline.is_empty() {
            return None;
        }
        let root_id = self.document.new_object_id();
        let ids: Vec<ObjectId> = (0..self.outline.len())
            .map(|_| self.document.new_object_id())
            .collect();

        let mut top_level = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); self.outline.len()];
        for (index, item) in self.outline.iter().enumerate() {
            match item.parent {
                Some(parent) => children[parent].push(index),
                None => top_level.push(index),
            }
        }

        // Parents precede children, so one reverse sweep totals descendants.
        let mut descendants = vec![0i64; self.outline.len()];
        for (index, item) in self.outline.iter().enumerate().rev() {
            if let Some(parent) = item.parent {
                descendants[parent] += 1 + descendants[index];
            }
        }

        let link_siblings = |siblings: &[usize], parent_id: ObjectId, objects: &mut Vec<(ObjectId, Dictionary)>| {
            for (pos, &index) in siblings.iter().enumerate() {
                let item = &self.outline[index];
                let mut dict = dictionary! {
                    "Title" => text_string(&item.title),
                    "Parent" => parent_id,
                    "Dest" => vec![item.page.into(), "Fit".into()],
                };
                if pos > 0 {
                    dict.set("Prev", ids[siblings[pos - 1]]);
                }
                if let Some(&next) = siblings.get(pos + 1) {
                    dict.set("Next", ids[next]);
                }
                if let (Some(&first), Some(&last)) = (children[index].first(), children[index].last()) {
                    dict.set("First", ids[first]);
                    dict.set("Last", ids[last]);
                    dict.set("Count", descendants[index]);
                }
                objects.push((ids[index], dict));
            }
        };

        let mut objects = Vec::with_capacity(self.outline.len());
        link_siblings(&top_level, root_id, &mut objects);
        for (index, kids) in children.iter().enumerate() {
            link_siblings(kids, ids[index], &mut objects);
        }
        for (id, dict) in objects {
            self.document.objects.insert(id, Object::Dictionary(dict));
        }

        let mut root = dictionary! {
            "Type" => "Outlines",
            "Count" => self.outline.len() as i64,
        };
        if let (Some(&first), Some(&last)) = (top_level.first(), top_level.last()) {
            root.set("First", ids[first]);
            root.set("Last", ids[last]);
        }
        self.document.objects.insert(root_id, Object::Dictionary(root));
        Some(root_id)
    }

    fn info_object(&mut self) -> Option<ObjectId> {
        let fields = [
            ("Title", &self.metadata.title),
            ("Author", &self.metadata.author),
            ("Subject", &self.metadata.subject),
            ("Keywords", &self.metadata.keywords),
            ("Creator", &self.metadata.creator),
        ];
        let mut info = Dictionary::new();
        for (key, value) in fields {
            if let Some(value) = value {
                info.set(key, text_string(value));
            }
        }
        if info.is_empty() {
            return None;
        }
        Some(self.document.add_object(info))
    }
}

impl DocumentWriter for PdfWriter {
    fn append(&mut self, pages: Pages) -> Result<usize, WriterError> {
        let mut source = pages.into_document();
        source.renumber_objects_with(self.document.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
        for &page_id in &page_ids {
            let inherited = inherited_attributes(&source, page_id);
            let page = source.get_object_mut(page_id)?.as_dict_mut()?;
            for (key, value) in inherited {
                if !page.has(&key) {
                    page.set(key, value);
                }
            }
            page.set("Parent", self.pages_id);
        }

        let max_id = source.objects.keys().map(|(id, _)| *id).max().unwrap_or(0);
        for (id, object) in source.objects {
            if is_type(&object, b"Catalog") || is_type(&object, b"Pages") {
                continue;
            }
            self.document.objects.insert(id, object);
        }
        self.document.max_id = self.document.max_id.max(max_id);
        self.pages.extend(&page_ids);
        Ok(page_ids.len())
    }

    fn add_outline(
        &mut self,
        title: &str,
        target_page: usize,
        parent: Option<OutlineHandle>,
    ) -> Result<OutlineHandle, WriterError> {
        let page = *self.pages.get(target_page).ok_or(WriterError::PageOutOfRange {
            page: target_page,
            total: self.pages.len(),
        })?;
        if let Some(OutlineHandle(parent)) = parent.filter(|p| p.0 >= self.outline.len()) {
            return Err(WriterError::UnknownParent(parent));
        }
        self.outline.push(OutlineItem {
            title: title.to_string(),
            page,
            parent: parent.map(|p| p.0),
        });
        Ok(OutlineHandle(self.outline.len() - 1))
    }

    fn set_metadata(&mut self, metadata: &DocumentMetadata) {
        self.metadata = metadata.clone();
    }

    fn finish(&mut self, path: &Path) -> Result<PathBuf, WriterError> {
        let kids: Vec<Object> = self.pages.iter().map(|&id| id.into()).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages.len() as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        };
        if let Some(outlines_id) = self.outline_objects() {
            catalog.set("Outlines", outlines_id);
            catalog.set("PageMode", "UseOutlines");
        }
        let catalog_id = self.document.add_object(catalog);
        self.document.trailer.set("Root", catalog_id);
        if let Some(info_id) = self.info_object() {
            self.document.trailer.set("Info", info_id);
        }

        let path = pdf_path(path);
        let mut file = BufWriter::new(File::create(&path)?);
        self.document.save_to(&mut file)?;
        file.flush()?;
        Ok(path)
    }
}

fn is_type(object: &Object, name: &[u8]) -> bool {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
        .is_some_and(|t| t == name)
}

/// Inheritable attributes found on the ancestors of a page, nearest first.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Vec<(Vec<u8>, Object)> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut visited = HashSet::new();
    let parent_of = |id: ObjectId| {
        doc.get_dictionary(id)
            .ok()
            .and_then(|dict| dict.get(b"Parent").ok())
            .and_then(|p| p.as_reference().ok())
    };

    let mut current = parent_of(page_id);
    while let Some(node_id) = current {
        if !visited.insert(node_id) {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE_ATTRIBUTES {
            if found.iter().any(|(k, _)| k == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
        current = parent_of(node_id);
    }
    found
}
