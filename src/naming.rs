//! Outline titles.
//!
//! An entry's outline title is its explicit label when one exists, otherwise
//! its base name. With prettification on, base names (never labels) are
//! cleaned up for display:
//!
//! - `q1_sales_REPORT` → "Q1 sales report"
//! - `_draft_` → "Draft"
//! - `Overview` → "Overview"

use crate::describe::Entry;

/// Replace underscores with spaces, trim, then capitalise the first
/// character and lowercase the rest.
pub fn prettify(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The outline title for an entry.
pub fn outline_title(entry: &Entry, pretty: bool) -> String {
    match &entry.label {
        Some(label) => label.clone(),
        None if pretty => prettify(&entry.base_name()),
        None => entry.base_name(),
    }
}
