//! Per-folder marker files.
//!
//! Every folder may carry a handful of dotfiles that change how it is bound
//! into the output document. None of them is ever emitted as content.
//!
//! ```text
//! reports/
//! ├── .title        # Outline title for this folder (plain text)
//! ├── .ignore       # Presence alone prunes this folder and everything below it
//! ├── .order        # One child name per line; listed names come first, in file order
//! ├── .label        # `file.pdf = Display Name` overrides for leaf outline titles
//! ├── .dpi          # Resolution override for images in this folder (e.g. `300`)
//! ├── 2023.pdf
//! └── charts/
//! ```
//!
//! Marker reads never fail a compile: an unreadable or malformed marker
//! degrades to the default for that field.

use crate::imaging::MAX_DPI;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const IGNORE_MARKER: &str = ".ignore";
pub const TITLE_MARKER: &str = ".title";
pub const ORDER_MARKER: &str = ".order";
pub const LABEL_MARKER: &str = ".label";
pub const DPI_MARKER: &str = ".dpi";

/// All recognised marker names.
pub const MARKER_NAMES: &[&str] = &[
    IGNORE_MARKER,
    TITLE_MARKER,
    ORDER_MARKER,
    LABEL_MARKER,
    DPI_MARKER,
];

/// Resolved configuration of a single folder.
///
/// Computed once when the folder is first visited and not mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderConfig {
    /// True if the folder carries an `.ignore` marker.
    pub ignored: bool,
    /// Text of the `.title` marker, trimmed. `None` when absent or unreadable.
    pub title: Option<String>,
    /// Leaf display-name overrides from `.label`, keyed by file name.
    pub labels: BTreeMap<String, String>,
    /// Child names from `.order`, in file order. `None` when there is no order file.
    pub order: Option<Vec<String>>,
    /// Raw `.dpi` override, passed through to the page materializer.
    pub resolution: Option<u32>,
}

impl FolderConfig {
    /// The folder's title: the `.title` text if set, otherwise `fallback`
    /// (normally the folder's own name).
    pub fn title_or(&self, fallback: &str) -> String {
        self.title.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// True if `name` is one of the marker files.
pub fn is_marker(name: &str) -> bool {
    MARKER_NAMES.contains(&name)
}

/// Resolve the marker files of `folder` into a [`FolderConfig`].
pub fn resolve_folder(folder: &Path) -> FolderConfig {
    let ignored = is_ignored(folder);
    if ignored {
        debug!(folder = %folder.display(), "folder carries an ignore marker");
        // Nothing else matters for a pruned folder.
        return FolderConfig {
            ignored,
            ..FolderConfig::default()
        };
    }

    FolderConfig {
        ignored,
        title: read_marker(&folder.join(TITLE_MARKER))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        labels: read_marker(&folder.join(LABEL_MARKER))
            .map(|s| parse_labels(&s))
            .unwrap_or_default(),
        order: read_marker(&folder.join(ORDER_MARKER)).map(|s| parse_order(&s)),
        resolution: read_marker(&folder.join(DPI_MARKER)).and_then(|s| parse_resolution(&s)),
    }
}

/// A folder is ignored if it holds an `.ignore` marker, or if the path
/// handed in is itself named like the marker.
fn is_ignored(folder: &Path) -> bool {
    folder.join(IGNORE_MARKER).exists()
        || folder
            .file_name()
            .is_some_and(|name| name == IGNORE_MARKER)
}

fn read_marker(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            debug!(marker = %path.display(), %err, "unreadable marker file, using defaults");
            None
        }
    }
}

/// Parse `.label` content: one `key = value` per line, split on the first `=`.
///
/// Lines without `=` or with an empty key are skipped. Later duplicates win.
pub fn parse_labels(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Parse `.order` content: one name per non-empty trimmed line, in file order.
pub fn parse_order(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `.dpi` content. Only an integer in `1..=MAX_DPI` counts.
pub fn parse_resolution(content: &str) -> Option<u32> {
    let dpi = content.trim().parse::<u32>().ok()?;
    if (1..=MAX_DPI).contains(&dpi) {
        Some(dpi)
    } else {
        debug!(dpi, max = MAX_DPI, "resolution marker out of range, ignored");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_no_markers() {
        let tmp = TempDir::new().unwrap();
        let config = resolve_folder(tmp.path());
        assert_eq!(config, FolderConfig::default());
        assert_eq!(config.title_or("reports"), "reports");
    }

    #[test]
    fn ignore_marker_detected() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".ignore"), "").unwrap();
        assert!(resolve_folder(tmp.path()).ignored);
    }

    #[test]
    fn path_named_like_ignore_marker_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let odd = tmp.path().join(".ignore");
        fs::create_dir(&odd).unwrap();
        assert!(resolve_folder(&odd).ignored);
    }

    #[test]
    fn title_is_trimmed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".title"), "  Annual Reports \n").unwrap();
        let config = resolve_folder(tmp.path());
        assert_eq!(config.title.as_deref(), Some("Annual Reports"));
        assert_eq!(config.title_or("reports"), "Annual Reports");
    }

    #[test]
    fn blank_title_falls_back_to_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".title"), "   \n").unwrap();
        assert_eq!(resolve_folder(tmp.path()).title_or("reports"), "reports");
    }

    #[test]
    fn labels_skip_malformed_lines() {
        let labels = parse_labels("chart.png = Q1 Chart\nno separator here\n\n = orphan\nb.pdf=B = two\n");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["chart.png"], "Q1 Chart");
        assert_eq!(labels["b.pdf"], "B = two");
    }

    #[test]
    fn order_keeps_file_order_and_drops_blanks() {
        assert_eq!(parse_order("b\n\n  a  \nc\n"), vec!["b", "a", "c"]);
    }

    #[test]
    fn order_absent_is_none_but_empty_file_is_some() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(resolve_folder(tmp.path()).order, None);

        fs::write(tmp.path().join(".order"), "\n").unwrap();
        assert_eq!(resolve_folder(tmp.path()).order, Some(vec![]));
    }

    #[test]
    fn resolution_parsing() {
        assert_eq!(parse_resolution("300\n"), Some(300));
        assert_eq!(parse_resolution("0"), None);
        assert_eq!(parse_resolution("-5"), None);
        assert_eq!(parse_resolution("high"), None);
    }

    #[test]
    fn resolution_above_max_is_ignored() {
        assert_eq!(parse_resolution("2400"), Some(2400));
        assert_eq!(parse_resolution("2401"), None);
        assert_eq!(parse_resolution("100000"), None);
        assert_eq!(parse_resolution("99999999999"), None);
    }

    #[test]
    fn all_markers_resolved_together() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".title"), "Photos").unwrap();
        fs::write(tmp.path().join(".label"), "x.jpg = Sunrise").unwrap();
        fs::write(tmp.path().join(".order"), "y.jpg\nx.jpg").unwrap();
        fs::write(tmp.path().join(".dpi"), "600").unwrap();

        let config = resolve_folder(tmp.path());
        assert!(!config.ignored);
        assert_eq!(config.title.as_deref(), Some("Photos"));
        assert_eq!(config.labels["x.jpg"], "Sunrise");
        assert_eq!(config.order, Some(vec!["y.jpg".into(), "x.jpg".into()]));
        assert_eq!(config.resolution, Some(600));
    }

    #[test]
    fn unreadable_marker_degrades_to_default() {
        let tmp = TempDir::new().unwrap();
        // A directory where a file is expected cannot be read as text.
        fs::create_dir(tmp.path().join(".label")).unwrap();
        let config = resolve_folder(tmp.path());
        assert!(config.labels.is_empty());
    }

    #[test]
    fn marker_names_recognised() {
        for name in MARKER_NAMES {
            assert!(is_marker(name));
        }
        assert!(!is_marker("report.pdf"));
    }
}
