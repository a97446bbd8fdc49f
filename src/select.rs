//! Folder traversal and path selection.
//!
//! Walks the content root depth-first and produces the flattened, ordered list
//! of everything that will be bound into the document. The output is a
//! pre-order traversal: each folder is immediately followed by all of its
//! selected descendants before any sibling appears.
//!
//! ## Rules, per folder
//!
//! 1. A folder with an `.ignore` marker is pruned with its whole subtree.
//! 2. Include/exclude patterns are matched (regex search) against the folder's
//!    path relative to the root; a miss prunes the subtree. The root itself
//!    is never filtered.
//! 3. The folder is emitted.
//! 4. Children are listed; dotfiles, markers and anything that is neither a
//!    folder, a PDF nor an image are dropped.
//! 5. Children named in `.order` come first, in hint order; the rest follow,
//!    sorted by case-insensitive name (exact name breaks remaining ties, so
//!    the result never depends on directory listing order).
//! 6. Sub-folders recurse; files are emitted if their relative path passes
//!    the patterns.
//!
//! Folders reached through symlinks are followed, except one that resolves to
//! a folder already on the current walk path: that would be a cycle, so it is
//! logged and skipped.
//!
//! Only an unreadable root is fatal. Anything below it that cannot be listed
//! is logged and treated as empty.

use crate::markers::{self, FolderConfig};
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("Cannot read root folder {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Root is not a folder: {0}")]
    RootNotFolder(PathBuf),
    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] regex::Error),
}

const PDF_EXTENSIONS: &[&str] = &["pdf"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "gif", "webp"];

/// What a path on disk is, as far as binding is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Folder,
    Pdf,
    Image,
    /// Not bindable. Never emitted by [`select`].
    Other,
}

/// Classify a path by file type and extension.
pub fn classify(path: &Path) -> PathKind {
    if path.is_dir() {
        return PathKind::Folder;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if PDF_EXTENSIONS.contains(&ext.as_str()) {
        PathKind::Pdf
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        PathKind::Image
    } else {
        PathKind::Other
    }
}

/// Include/exclude regexes applied to root-relative paths.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PathFilter {
    /// Compile the patterns. Any invalid pattern is an error.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, SelectError> {
        let compile = |patterns: &[S]| {
            patterns
                .iter()
                .map(|p| Regex::new(p.as_ref()))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// A path passes if it matches some include pattern (or there are none)
    /// and matches no exclude pattern.
    pub fn matches(&self, relative: &str) -> bool {
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(relative)) {
            return false;
        }
        !self.exclude.iter().any(|re| re.is_match(relative))
    }
}

/// One emitted path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedPath {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated. Empty for the root itself.
    pub relative: String,
    pub kind: PathKind,
}

/// What the selector learned about a selected folder while visiting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFolder {
    pub config: FolderConfig,
    /// At least one direct child is a PDF (regardless of filters).
    pub has_pdf: bool,
    /// At least one direct child is an image (regardless of filters).
    pub has_image: bool,
    /// Effective resolution: this folder's `.dpi`, else the nearest ancestor's.
    pub resolution: Option<u32>,
}

/// Result of a traversal.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Emitted paths in pre-order.
    pub paths: Vec<SelectedPath>,
    /// Per-folder state for every selected folder, keyed by absolute path.
    pub folders: BTreeMap<PathBuf, SelectedFolder>,
}

impl Selection {
    pub fn folder(&self, path: &Path) -> Option<&SelectedFolder> {
        self.folders.get(path)
    }
}

/// Walk `root` and return everything selected, in binding order.
pub fn select(root: &Path, filter: &PathFilter) -> Result<Selection, SelectError> {
    let root = fs::canonicalize(root).map_err(|source| SelectError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;
    if !root.is_dir() {
        return Err(SelectError::RootNotFolder(root));
    }

    let mut walker = Walker {
        filter,
        selection: Selection::default(),
        ancestors: HashSet::new(),
    };

    let config = markers::resolve_folder(&root);
    if config.ignored {
        debug!(root = %root.display(), "root carries an ignore marker, nothing selected");
        return Ok(walker.selection);
    }

    let children = list_children(&root).map_err(|source| SelectError::RootUnreadable {
        path: root.clone(),
        source,
    })?;
    walker.ancestors.insert(root.clone());
    walker.enter(&root, String::new(), None, config, children);
    Ok(walker.selection)
}

struct Walker<'a> {
    filter: &'a PathFilter,
    selection: Selection,
    /// Canonical paths of the folders on the current walk path.
    ancestors: HashSet<PathBuf>,
}

impl Walker<'_> {
    fn visit_folder(&mut self, folder: &Path, relative: String, inherited: Option<u32>) {
        let config = markers::resolve_folder(folder);
        if config.ignored {
            debug!(folder = %relative, "pruned by ignore marker");
            return;
        }
        if !self.filter.matches(&relative) {
            debug!(folder = %relative, "pruned by path patterns");
            return;
        }
        let canonical = match fs::canonicalize(folder) {
            Ok(canonical) => canonical,
            Err(err) => {
                warn!(folder = %folder.display(), %err, "cannot resolve folder, skipping it");
                return;
            }
        };
        if self.ancestors.contains(&canonical) {
            warn!(
                folder = %relative,
                target = %canonical.display(),
                "folder links back to one of its ancestors, skipping it"
            );
            return;
        }
        let children = list_children(folder).unwrap_or_else(|err| {
            warn!(folder = %folder.display(), %err, "cannot list folder, treating it as empty");
            Vec::new()
        });
        self.ancestors.insert(canonical.clone());
        self.enter(folder, relative, inherited, config, children);
        self.ancestors.remove(&canonical);
    }

    fn enter(
        &mut self,
        folder: &Path,
        relative: String,
        inherited: Option<u32>,
        config: FolderConfig,
        mut children: Vec<Child>,
    ) {
        let resolution = config.resolution.or(inherited);
        let has_pdf = children.iter().any(|c| c.kind == PathKind::Pdf);
        let has_image = children.iter().any(|c| c.kind == PathKind::Image);
        order_children(&mut children, config.order.as_deref());

        self.selection.paths.push(SelectedPath {
            path: folder.to_path_buf(),
            relative: relative.clone(),
            kind: PathKind::Folder,
        });
        self.selection.folders.insert(
            folder.to_path_buf(),
            SelectedFolder {
                config,
                has_pdf,
                has_image,
                resolution,
            },
        );

        for child in children {
            let child_relative = join_relative(&relative, &child.name);
            if child.kind == PathKind::Folder {
                self.visit_folder(&child.path, child_relative, resolution);
            } else if self.filter.matches(&child_relative) {
                self.selection.paths.push(SelectedPath {
                    path: child.path,
                    relative: child_relative,
                    kind: child.kind,
                });
            } else {
                debug!(file = %child_relative, "skipped by path patterns");
            }
        }
    }
}

/// A bindable direct child of a folder.
#[derive(Debug)]
struct Child {
    path: PathBuf,
    name: String,
    kind: PathKind,
}

fn list_children(folder: &Path) -> std::io::Result<Vec<Child>> {
    let mut children = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(folder = %folder.display(), %err, "unreadable directory entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        // Markers are dotfiles too, but check them by name in case that changes.
        if name.starts_with('.') || markers::is_marker(&name) {
            continue;
        }
        let path = entry.path();
        let kind = classify(&path);
        if kind == PathKind::Other {
            continue;
        }
        children.push(Child { path, name, kind });
    }
    Ok(children)
}

fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn order_children(children: &mut [Child], hints: Option<&[String]>) {
    let positions = hint_positions(hints);
    children.sort_by(|a, b| compare_names(&a.name, &b.name, &positions));
}

/// Map each hinted name to its first position in the hint list.
fn hint_positions(hints: Option<&[String]>) -> HashMap<&str, usize> {
    let mut positions = HashMap::new();
    for (i, name) in hints.unwrap_or_default().iter().enumerate() {
        positions.entry(name.as_str()).or_insert(i);
    }
    positions
}

fn compare_names(a: &str, b: &str, positions: &HashMap<&str, usize>) -> Ordering {
    let rank = |name: &str| positions.get(name).copied().unwrap_or(usize::MAX);
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Sort bare names the way a folder's children are sorted.
pub fn sort_names(names: &mut [String], hints: Option<&[String]>) {
    let positions = hint_positions(hints);
    names.sort_by(|a, b| compare_names(a, b, &positions));
}
