//! Page positions and the outline tree.
//!
//! Given the ordered entries and a page count for each content entry, the
//! assembler works out where every entry starts in the output document and
//! which entries get an outline (bookmark) node.
//!
//! ## Pagination
//!
//! A forward pass keeps a running page cursor. Every entry starts at the
//! current cursor; content entries then advance it by their page count.
//! Folders contribute nothing, so a folder starts where its first page-bearing
//! descendant starts.
//!
//! A second, backward pass handles folders whose whole subtree contributes no
//! pages (empty, or nothing readable): they take the start of the nearest
//! later page-bearing entry, or the end of the document if there is none.
//!
//! ## Outline
//!
//! One forward pass over the entries, carrying a map from folder path to the
//! node created for that folder. An entry gets a node unless:
//!
//! - it is content with zero pages (unreadable), or
//! - it is an image whose folder holds only images; the folder's node already
//!   points at the first of them.
//!
//! Nodes are stored flat in creation order and refer to their parent by index.

use crate::describe::{Entry, EntryKind};
use crate::naming;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub title: String,
    /// 0-based page the node points at.
    pub target_page: usize,
    /// Index of the parent node; `None` for top-level nodes.
    pub parent: Option<usize>,
    /// Index of the entry this node was created for.
    pub entry: usize,
}

/// The outline as a flat arena. Parents always precede their children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline {
    nodes: Vec<OutlineNode>,
}

impl Outline {
    pub fn nodes(&self) -> &[OutlineNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OutlineNode> {
        self.nodes.get(index)
    }

    /// Direct children of `parent` (`None` for top level), in creation order.
    pub fn children(&self, parent: Option<usize>) -> impl Iterator<Item = (usize, &OutlineNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.parent == parent)
    }

    /// Nesting depth of a node; top-level nodes are depth 0.
    pub fn depth(&self, index: usize) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(index).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes.get(parent).and_then(|n| n.parent);
        }
        depth
    }

    fn push(&mut self, node: OutlineNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Entries with positions resolved, plus the outline built from them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Assembly {
    pub entries: Vec<Entry>,
    pub outline: Outline,
    pub total_pages: usize,
}

/// Assign page positions and build the outline.
///
/// `page_count` is asked once per content entry; folders always count 0.
/// With `pretty` set, unlabelled titles are prettified (see [`naming`]).
pub fn assemble<F>(mut entries: Vec<Entry>, mut page_count: F, pretty: bool) -> Assembly
where
    F: FnMut(&Entry) -> usize,
{
    for entry in entries.iter_mut() {
        entry.page_count = if entry.is_folder() { 0 } else { page_count(entry) };
    }

    let total_pages = paginate(&mut entries);
    backfill_empty_folders(&mut entries, total_pages);
    let outline = build_outline(&mut entries, pretty);

    Assembly {
        entries,
        outline,
        total_pages,
    }
}

/// Forward pass. Returns the final cursor, i.e. the total page count.
fn paginate(entries: &mut [Entry]) -> usize {
    let mut cursor = 0;
    for entry in entries.iter_mut() {
        entry.start_page = Some(cursor);
        cursor += entry.page_count;
    }
    cursor
}

/// Backward pass for folders with no pages anywhere below them.
fn backfill_empty_folders(entries: &mut [Entry], total_pages: usize) {
    let subtree = subtree_pages(entries);
    let mut next_start = total_pages;

    for (entry, pages_below) in entries.iter_mut().zip(subtree).rev() {
        if entry.page_count > 0 {
            if let Some(start) = entry.start_page {
                next_start = start;
            }
        } else if entry.is_folder() && pages_below == 0 {
            entry.start_page = Some(next_start);
        }
    }
}

/// Pages contributed by each folder's subtree (0 for content entries).
///
/// Relies on pre-order: a folder's descendants are exactly the entries that
/// follow it while their paths stay inside it.
fn subtree_pages(entries: &[Entry]) -> Vec<usize> {
    let mut totals = vec![0; entries.len()];
    let mut open: Vec<usize> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        while let Some(&top) = open.last() {
            if entry.path.starts_with(&entries[top].path) {
                break;
            }
            open.pop();
        }
        if entry.is_folder() {
            open.push(i);
        } else {
            for &folder in &open {
                totals[folder] += entry.page_count;
            }
        }
    }
    totals
}

fn build_outline(entries: &mut [Entry], pretty: bool) -> Outline {
    let image_only: HashSet<PathBuf> = entries
        .iter()
        .filter(|e| e.is_folder() && e.only_images)
        .map(|e| e.path.clone())
        .collect();

    let mut outline = Outline::default();
    let mut folder_nodes: HashMap<PathBuf, usize> = HashMap::new();

    for (index, entry) in entries.iter_mut().enumerate() {
        let Some(target_page) = entry.start_page else {
            continue;
        };
        if !entry.is_folder() && entry.page_count == 0 {
            continue;
        }
        if entry.kind == EntryKind::Image && in_image_only_folder(entry, &image_only) {
            continue;
        }

        let parent = entry
            .parent()
            .and_then(|folder| folder_nodes.get(folder))
            .copied();
        let node = outline.push(OutlineNode {
            title: naming::outline_title(entry, pretty),
            target_page,
            parent,
            entry: index,
        });
        entry.outline = Some(node);

        if entry.is_folder() {
            folder_nodes.insert(entry.path.clone(), node);
        }
    }

    outline
}

fn in_image_only_folder(entry: &Entry, image_only: &HashSet<PathBuf>) -> bool {
    entry
        .parent()
        .is_some_and(|folder: &Path| image_only.contains(folder))
}
