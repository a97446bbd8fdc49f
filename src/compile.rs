//! End-to-end compile: folder tree in, bound document out.
//!
//! ```text
//! select → describe → materialize (parallel) → assemble → append pages
//!        → outline items → metadata → finish
//! ```
//!
//! Only an unusable root, a bad filter pattern, or a failure to write the
//! output stops a compile. Unreadable files are skipped with a warning and
//! outline items the writer rejects are dropped, their children re-attached
//! to the nearest ancestor that made it in.
//!
//! Materialization runs on rayon's global pool; results are collected back
//! in entry order, so page order never depends on scheduling.

use crate::assemble::{Assembly, Outline, assemble};
use crate::describe::{Entry, describe};
use crate::materialize::{PageMaterializer, Pages};
use crate::select::{PathFilter, SelectError, select};
use crate::writer::{DocumentMetadata, DocumentWriter, OutlineHandle, WriterError};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{0}")]
    Select(#[from] SelectError),
    #[error("Cannot write output: {0}")]
    Writer(#[from] WriterError),
}

/// Options for one compile run. Page size and resolution belong to the
/// [`PageMaterializer`] passed alongside.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Prettify unlabelled outline titles.
    pub pretty: bool,
    pub output: PathBuf,
    /// Metadata given by the user; title and creator are defaulted.
    pub metadata: DocumentMetadata,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            pretty: false,
            output: PathBuf::from("output.pdf"),
            metadata: DocumentMetadata::default(),
        }
    }
}

/// Something that was left out of the output, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a successful compile.
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub assembly: Assembly,
    /// Content entries that contributed no pages.
    pub skipped: Vec<Issue>,
    /// Outline nodes the writer rejected.
    pub failed_outlines: Vec<Issue>,
    /// Path actually written.
    pub output: PathBuf,
}

impl CompileReport {
    pub fn entries(&self) -> &[Entry] {
        &self.assembly.entries
    }

    pub fn outline(&self) -> &Outline {
        &self.assembly.outline
    }

    pub fn total_pages(&self) -> usize {
        self.assembly.total_pages
    }
}

/// Select and describe without touching any content (dry run).
pub fn plan(root: &Path, options: &CompileOptions) -> Result<Vec<Entry>, CompileError> {
    let filter = PathFilter::new(options.include.as_slice(), options.exclude.as_slice())?;
    let selection = select(root, &filter)?;
    Ok(describe(&selection))
}

/// Compile the tree at `root` into `options.output`.
pub fn compile(
    root: &Path,
    options: &CompileOptions,
    materializer: &dyn PageMaterializer,
    writer: &mut dyn DocumentWriter,
) -> Result<CompileReport, CompileError> {
    info!(root = %root.display(), "selecting");
    let mut entries = plan(root, options)?;
    info!(entries = entries.len(), "materializing");

    let (pages, skipped) = materialize_all(&mut entries, materializer);
    let assembly = assemble(entries, |entry| entry.page_count, options.pretty);
    info!(
        pages = assembly.total_pages,
        outline = assembly.outline.len(),
        "assembled"
    );

    for pages in pages.into_iter().flatten() {
        writer.append(pages)?;
    }
    let failed_outlines = write_outline(&assembly, writer);

    writer.set_metadata(&resolve_metadata(&options.metadata, &assembly.entries));
    let output = writer.finish(&options.output)?;
    info!(output = %output.display(), "written");

    Ok(CompileReport {
        assembly,
        skipped,
        failed_outlines,
        output,
    })
}

/// Materialize every content entry in parallel, recording page counts on
/// the entries. Returns the pages (in entry order) and the failures.
fn materialize_all(
    entries: &mut [Entry],
    materializer: &dyn PageMaterializer,
) -> (Vec<Option<Pages>>, Vec<Issue>) {
    let results: Vec<_> = entries
        .par_iter()
        .map(|entry| (!entry.is_folder()).then(|| materializer.materialize(entry)))
        .collect();

    let mut pages = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();
    for (entry, result) in entries.iter_mut().zip(results) {
        match result {
            None => pages.push(None),
            Some(Ok(materialized)) => {
                entry.page_count = materialized.page_count();
                debug!(path = %entry.path.display(), pages = entry.page_count, "materialized");
                if entry.page_count == 0 {
                    skipped.push(Issue {
                        path: entry.path.clone(),
                        reason: "no pages".into(),
                    });
                }
                pages.push(Some(materialized));
            }
            Some(Err(e)) => {
                warn!(path = %entry.path.display(), error = %e, "skipping unreadable file");
                entry.page_count = 0;
                skipped.push(Issue {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                });
                pages.push(None);
            }
        }
    }
    (pages, skipped)
}

/// Hand the outline to the writer. A rejected node is skipped and its
/// children hang off the nearest surviving ancestor instead.
fn write_outline(assembly: &Assembly, writer: &mut dyn DocumentWriter) -> Vec<Issue> {
    let nodes = assembly.outline.nodes();
    let mut handles: Vec<Option<OutlineHandle>> = Vec::with_capacity(nodes.len());
    let mut failed = Vec::new();

    for node in nodes {
        let mut ancestor = node.parent;
        let parent = loop {
            match ancestor {
                Some(index) => match handles[index] {
                    Some(handle) => break Some(handle),
                    None => ancestor = nodes[index].parent,
                },
                None => break None,
            }
        };

        match writer.add_outline(&node.title, node.target_page, parent) {
            Ok(handle) => handles.push(Some(handle)),
            Err(e) => {
                let path = assembly.entries[node.entry].path.clone();
                warn!(path = %path.display(), error = %e, "failed to add outline item");
                failed.push(Issue {
                    path,
                    reason: e.to_string(),
                });
                handles.push(None);
            }
        }
    }
    failed
}

/// User metadata with the title defaulted to the root folder's name and the
/// creator set to this tool.
fn resolve_metadata(user: &DocumentMetadata, entries: &[Entry]) -> DocumentMetadata {
    let root_name = entries
        .first()
        .filter(|e| e.is_folder())
        .and_then(|e| e.path.file_name())
        .map(|n| n.to_string_lossy().into_owned());

    user.clone().or(DocumentMetadata {
        title: root_name,
        creator: Some(format!("foldpdf {}", env!("CARGO_PKG_VERSION"))),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::tests::MockMaterializer;
    use crate::writer::tests::{MockWriter, RecordedOp};
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "x").unwrap();
    }

    fn appends(writer: &MockWriter) -> Vec<usize> {
        writer
            .get_ops()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Append(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn root_name(tmp: &TempDir) -> String {
        tmp.path()
            .canonicalize()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    // =========================================================================
    // Dry run
    // =========================================================================

    #[test]
    fn plan_lists_entries_without_materializing() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.pdf"));
        touch(&tmp.path().join("sub/b.png"));

        let entries = plan(tmp.path(), &CompileOptions::default()).unwrap();
        let relative: Vec<&str> = entries.iter().map(|e| e.relative.as_str()).collect();
        assert_eq!(relative, vec!["", "a.pdf", "sub", "sub/b.png"]);
        assert!(entries.iter().all(|e| e.page_count == 0));
    }

    #[test]
    fn plan_rejects_bad_pattern() {
        let tmp = TempDir::new().unwrap();
        let options = CompileOptions {
            include: vec!["(".into()],
            ..Default::default()
        };
        let result = plan(tmp.path(), &options);
        assert!(matches!(result, Err(CompileError::Select(SelectError::Pattern(_)))));
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let materializer = MockMaterializer::default();
        let mut writer = MockWriter::default();
        let result = compile(
            &tmp.path().join("nope"),
            &CompileOptions::default(),
            &materializer,
            &mut writer,
        );
        assert!(matches!(result, Err(CompileError::Select(_))));
        assert!(writer.get_ops().is_empty());
    }

    // =========================================================================
    // Full compile against mocks
    // =========================================================================

    #[test]
    fn pages_appended_in_emission_order() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.pdf"));
        touch(&tmp.path().join("b/c.pdf"));
        touch(&tmp.path().join("d.pdf"));
        let materializer = MockMaterializer::with_pages(&[("a.pdf", 2), ("c.pdf", 5), ("d.pdf", 1)]);
        let mut writer = MockWriter::default();

        let report = compile(tmp.path(), &CompileOptions::default(), &materializer, &mut writer).unwrap();

        // Folders and files interleave by name.
        assert_eq!(appends(&writer), vec![2, 5, 1]);
        assert_eq!(report.total_pages(), 8);
        assert_eq!(materializer.requested(), vec!["a.pdf", "c.pdf", "d.pdf"]);
    }

    #[test]
    fn outline_mirrors_folders() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("intro.pdf"));
        touch(&tmp.path().join("part/ch1.pdf"));
        let materializer = MockMaterializer::with_pages(&[("intro.pdf", 1), ("ch1.pdf", 3)]);
        let mut writer = MockWriter::default();

        compile(tmp.path(), &CompileOptions::default(), &materializer, &mut writer).unwrap();

        let root = root_name(&tmp);
        assert_eq!(
            writer.outlines(),
            vec![
                (root, 0, None),
                ("intro".to_string(), 0, Some(0)),
                ("part".to_string(), 1, Some(0)),
                ("ch1".to_string(), 1, Some(2)),
            ]
        );
    }

    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("good.pdf"));
        touch(&tmp.path().join("bad.pdf"));
        let materializer = MockMaterializer::with_pages(&[("good.pdf", 2)]);
        let mut writer = MockWriter::default();

        let report = compile(tmp.path(), &CompileOptions::default(), &materializer, &mut writer).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("bad.pdf"));
        assert_eq!(appends(&writer), vec![2]);
        let titles: Vec<String> = writer.outlines().into_iter().map(|o| o.0).collect();
        assert!(!titles.contains(&"bad".to_string()));
        assert!(titles.contains(&"good".to_string()));
    }

    #[test]
    fn image_only_folder_gets_single_outline_node() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("photos/x.jpg"));
        touch(&tmp.path().join("photos/y.png"));
        let materializer = MockMaterializer::with_pages(&[("x.jpg", 1), ("y.png", 1)]);
        let mut writer = MockWriter::default();

        compile(tmp.path(), &CompileOptions::default(), &materializer, &mut writer).unwrap();

        assert_eq!(appends(&writer), vec![1, 1]);
        let titles: Vec<String> = writer.outlines().into_iter().map(|o| o.0).collect();
        assert_eq!(titles, vec![root_name(&tmp), "photos".to_string()]);
    }

    #[test]
    fn failed_outline_children_reattach_to_grandparent() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("part/ch1.pdf"));
        let materializer = MockMaterializer::with_pages(&[("ch1.pdf", 2)]);
        let mut writer = MockWriter::failing(&["part"]);

        let report = compile(tmp.path(), &CompileOptions::default(), &materializer, &mut writer).unwrap();

        assert_eq!(report.failed_outlines.len(), 1);
        assert!(report.failed_outlines[0].path.ends_with("part"));
        assert_eq!(
            writer.outlines(),
            vec![(root_name(&tmp), 0, None), ("ch1".to_string(), 0, Some(0))]
        );
    }

    #[test]
    fn trailing_empty_folder_outline_fails_softly() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.pdf"));
        fs::create_dir_all(tmp.path().join("zz_empty")).unwrap();
        let materializer = MockMaterializer::with_pages(&[("a.pdf", 1)]);
        let mut writer = MockWriter::default();

        let report = compile(tmp.path(), &CompileOptions::default(), &materializer, &mut writer).unwrap();

        let empty = report.entries().iter().find(|e| e.relative == "zz_empty").unwrap();
        assert_eq!(empty.start_page, Some(1));
        assert_eq!(report.failed_outlines.len(), 1);
    }

    #[test]
    fn metadata_defaults_title_and_creator() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.pdf"));
        let materializer = MockMaterializer::with_pages(&[("a.pdf", 1)]);
        let mut writer = MockWriter::default();
        let options = CompileOptions {
            metadata: DocumentMetadata {
                author: Some("Ann".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        compile(tmp.path(), &options, &materializer, &mut writer).unwrap();

        let metadata = writer
            .get_ops()
            .into_iter()
            .find_map(|op| match op {
                RecordedOp::Metadata(m) => Some(m),
                _ => None,
            })
            .unwrap();
        assert_eq!(metadata.title, Some(root_name(&tmp)));
        assert_eq!(metadata.author.as_deref(), Some("Ann"));
        assert!(metadata.creator.unwrap().starts_with("foldpdf "));
    }

    #[test]
    fn explicit_title_wins() {
        let tmp = TempDir::new().unwrap();
        let materializer = MockMaterializer::default();
        let mut writer = MockWriter::default();
        let options = CompileOptions {
            metadata: DocumentMetadata {
                title: Some("Binder".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        compile(tmp.path(), &options, &materializer, &mut writer).unwrap();

        let ops = writer.get_ops();
        assert!(ops.iter().any(
            |op| matches!(op, RecordedOp::Metadata(m) if m.title.as_deref() == Some("Binder"))
        ));
    }

    #[test]
    fn output_path_gets_pdf_extension() {
        let tmp = TempDir::new().unwrap();
        let materializer = MockMaterializer::default();
        let mut writer = MockWriter::default();
        let options = CompileOptions {
            output: PathBuf::from("binder.out"),
            ..Default::default()
        };

        let report = compile(tmp.path(), &options, &materializer, &mut writer).unwrap();
        assert_eq!(report.output, PathBuf::from("binder.pdf"));
    }

    #[test]
    fn pretty_titles_applied() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("annual_REPORT.pdf"));
        let materializer = MockMaterializer::with_pages(&[("annual_REPORT.pdf", 1)]);
        let mut writer = MockWriter::default();
        let options = CompileOptions {
            pretty: true,
            ..Default::default()
        };

        compile(tmp.path(), &options, &materializer, &mut writer).unwrap();
        let titles: Vec<String> = writer.outlines().into_iter().map(|o| o.0).collect();
        assert!(titles.contains(&"Annual report".to_string()));
    }
}
