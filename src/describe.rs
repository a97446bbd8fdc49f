//! Typed entries for everything that was selected.
//!
//! The describer turns the selector's flat path list into [`Entry`] values
//! carrying what later stages need: resolved folder titles, per-file label
//! overrides, the image-only flag and the effective image resolution. It is
//! a pure function of the [`Selection`]; all filesystem work already happened
//! during traversal.

use crate::select::{PathKind, SelectedFolder, Selection};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Kind of a bound entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    Pdf,
    Image,
}

/// One unit of the compile pipeline: a folder or a content file.
///
/// Entries are kept in a flat `Vec` in pre-order; folder/child relationships
/// are recovered from paths rather than stored as links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub path: PathBuf,
    /// Root-relative path, `/`-separated; empty for the root.
    pub relative: String,
    pub kind: EntryKind,
    /// Resolved folder title (`.title` text or folder name). Folders only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Explicit display-name override: `.label` for files, `.title` for folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Folder whose direct children include images but no PDFs.
    pub only_images: bool,
    /// Effective resolution override for image rendering, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
    /// Pages contributed. Always 0 for folders and for unreadable content.
    pub page_count: usize,
    /// First page of this entry in the output, 0-based.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_page: Option<usize>,
    /// Index of this entry's node in the assembled outline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<usize>,
}

impl Entry {
    /// A bare folder entry.
    pub fn folder(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self::new(path.into(), EntryKind::Folder, Some(title.into()))
    }

    /// A bare content entry.
    pub fn file(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self::new(path.into(), kind, None)
    }

    fn new(path: PathBuf, kind: EntryKind, title: Option<String>) -> Self {
        Self {
            path,
            relative: String::new(),
            kind,
            title,
            label: None,
            only_images: false,
            resolution: None,
            page_count: 0,
            start_page: None,
            outline: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.page_count = pages;
        self
    }

    pub fn with_only_images(mut self, only_images: bool) -> Self {
        self.only_images = only_images;
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Folder containing this entry.
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }

    /// Name used when no label is set: the folder title for folders, the
    /// file stem for content.
    pub fn base_name(&self) -> String {
        match (&self.kind, &self.title) {
            (EntryKind::Folder, Some(title)) => title.clone(),
            (EntryKind::Folder, None) => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            _ => self
                .path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Build the entry list for a selection, preserving its order.
pub fn describe(selection: &Selection) -> Vec<Entry> {
    let mut entries = Vec::with_capacity(selection.paths.len());

    for selected in &selection.paths {
        let entry = match selected.kind {
            PathKind::Folder => describe_folder(&selected.path, selection.folder(&selected.path)),
            PathKind::Pdf => describe_file(&selected.path, EntryKind::Pdf, selection),
            PathKind::Image => describe_file(&selected.path, EntryKind::Image, selection),
            PathKind::Other => {
                debug!(path = %selected.path.display(), "unclassifiable path dropped");
                continue;
            }
        };
        entries.push(Entry {
            relative: selected.relative.clone(),
            ..entry
        });
    }

    entries
}

fn describe_folder(path: &Path, folder: Option<&SelectedFolder>) -> Entry {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(folder) = folder else {
        return Entry::folder(path, name);
    };

    Entry {
        label: folder.config.title.clone(),
        only_images: folder.has_image && !folder.has_pdf,
        resolution: folder.resolution,
        ..Entry::folder(path, folder.config.title_or(&name))
    }
}

fn describe_file(path: &Path, kind: EntryKind, selection: &Selection) -> Entry {
    let mut entry = Entry::file(path, kind);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if let Some(folder) = path.parent().and_then(|p| selection.folder(p)) {
        entry.label = folder.config.labels.get(&name).cloned();
        entry.resolution = folder.resolution;
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::{PathFilter, select};
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    fn describe_dir(root: &Path) -> Vec<Entry> {
        describe(&select(root, &PathFilter::default()).unwrap())
    }

    #[test]
    fn kinds_follow_selection() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.pdf"));
        touch(&tmp.path().join("b.jpg"));

        let entries = describe_dir(tmp.path());
        let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Folder, EntryKind::Pdf, EntryKind::Image]);
        assert_eq!(entries[1].relative, "a.pdf");
    }

    #[test]
    fn folder_title_defaults_to_name() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("reports/a.pdf"));

        let entries = describe_dir(tmp.path());
        assert_eq!(entries[1].title.as_deref(), Some("reports"));
        assert_eq!(entries[1].label, None);
    }

    #[test]
    fn folder_title_marker_becomes_label() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("reports/a.pdf"));
        fs::write(tmp.path().join("reports/.title"), "Annual Reports").unwrap();

        let entries = describe_dir(tmp.path());
        assert_eq!(entries[1].title.as_deref(), Some("Annual Reports"));
        assert_eq!(entries[1].label.as_deref(), Some("Annual Reports"));
    }

    #[test]
    fn file_label_from_enclosing_folder() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("charts/chart.png"));
        touch(&tmp.path().join("charts/other.png"));
        fs::write(tmp.path().join("charts/.label"), "chart.png = Q1 Chart\n").unwrap();

        let entries = describe_dir(tmp.path());
        let chart = entries.iter().find(|e| e.relative == "charts/chart.png").unwrap();
        let other = entries.iter().find(|e| e.relative == "charts/other.png").unwrap();
        assert_eq!(chart.label.as_deref(), Some("Q1 Chart"));
        assert_eq!(other.label, None);
    }

    #[test]
    fn only_images_looks_at_direct_children_only() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("photos/x.jpg"));
        touch(&tmp.path().join("photos/y.png"));
        touch(&tmp.path().join("photos/nested/doc.pdf"));
        touch(&tmp.path().join("mixed/a.pdf"));
        touch(&tmp.path().join("mixed/b.jpg"));
        touch(&tmp.path().join("docs/a.pdf"));

        let entries = describe_dir(tmp.path());
        let flag = |rel: &str| entries.iter().find(|e| e.relative == rel).unwrap().only_images;
        assert!(flag("photos"));
        assert!(!flag("photos/nested"));
        assert!(!flag("mixed"));
        assert!(!flag("docs"));
        assert!(!flag(""));
    }

    #[test]
    fn excluded_pdf_still_counts_against_only_images() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("album/a.jpg"));
        touch(&tmp.path().join("album/draft.pdf"));

        let filter = PathFilter::new(&[] as &[&str], &["draft"]).unwrap();
        let entries = describe(&select(tmp.path(), &filter).unwrap());
        let album = entries.iter().find(|e| e.relative == "album").unwrap();
        assert!(!album.only_images);
    }

    #[test]
    fn resolution_cascades_to_files() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("scans/deep/page.png"));
        fs::write(tmp.path().join("scans/.dpi"), "300").unwrap();

        let entries = describe_dir(tmp.path());
        let page = entries.iter().find(|e| e.relative == "scans/deep/page.png").unwrap();
        assert_eq!(page.resolution, Some(300));
    }

    #[test]
    fn unclassifiable_paths_are_dropped() {
        let selection = Selection {
            paths: vec![crate::select::SelectedPath {
                path: PathBuf::from("/nowhere/notes.txt"),
                relative: "notes.txt".into(),
                kind: PathKind::Other,
            }],
            ..Selection::default()
        };
        assert!(describe(&selection).is_empty());
    }

    #[test]
    fn base_names() {
        assert_eq!(Entry::folder("/a/reports", "Annual").base_name(), "Annual");
        assert_eq!(Entry::file("/a/q1_report.pdf", EntryKind::Pdf).base_name(), "q1_report");
        assert_eq!(Entry::file("/a/archive.tar.png", EntryKind::Image).base_name(), "archive.tar");
    }

    #[test]
    fn new_entries_have_no_pages_or_position() {
        let entry = Entry::file("/a/b.pdf", EntryKind::Pdf);
        assert_eq!(entry.page_count, 0);
        assert_eq!(entry.start_page, None);
        assert_eq!(entry.outline, None);
        assert!(!entry.is_folder());
    }
}
