//! Catalog list management.
//!
//! The ordered list of [`CatalogEntry`] values is what the user edits; the
//! mapping sent on the wire is always rebuilt from the whole list.

use serde_json::{Map, Value};

use crate::models::configuration::value_text;
use crate::models::CatalogEntry;

/// Input type prefix addressing a catalog entry (`catalog-<index>`).
pub const CATALOG_TYPE_PREFIX: &str = "catalog-";

/// Resolve a `catalog-<index>` input type.
///
/// Returns `None` when `input_type` does not address the catalog at all, and
/// `Some(None)` when it does but the index is not a valid number.
pub fn catalog_target(input_type: &str) -> Option<Option<usize>> {
    input_type.strip_prefix(CATALOG_TYPE_PREFIX).map(|index| index.parse().ok())
}

/// Append a blank entry.
pub fn append_blank(list: &mut Vec<CatalogEntry>) {
    list.push(CatalogEntry::default());
}

/// Remove the entry at `index`; out-of-range indices leave the list alone.
pub fn remove_at(list: &mut Vec<CatalogEntry>, index: usize) -> Option<CatalogEntry> {
    (index < list.len()).then(|| list.remove(index))
}

/// Largest catalog list an edit may pad out to.
pub const MAX_CATALOG_ENTRIES: usize = 1024;

/// Outcome of a catalog entry edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEdit {
    Applied,
    /// Field name was neither "name" nor "value".
    UnknownField,
    /// Index at or past [`MAX_CATALOG_ENTRIES`].
    OutOfRange,
}

/// Set `field` ("name" or "value") of the entry at `index`.
///
/// Indices past the end pad the list with blank entries first, up to
/// [`MAX_CATALOG_ENTRIES`]. The list is untouched unless the edit is applied.
pub fn set_entry_field(
    list: &mut Vec<CatalogEntry>,
    index: usize,
    field: &str,
    value: String,
) -> EntryEdit {
    if field != "name" && field != "value" {
        return EntryEdit::UnknownField;
    }
    if index >= list.len() {
        if index >= MAX_CATALOG_ENTRIES {
            return EntryEdit::OutOfRange;
        }
        tracing::debug!(index, len = list.len(), "Padding catalog list");
        list.resize_with(index + 1, CatalogEntry::default);
    }

    let entry = &mut list[index];
    if field == "name" {
        entry.name = value;
    } else {
        entry.value = value;
    }
    EntryEdit::Applied
}

/// Project the list into a `name -> value` mapping; the last duplicate wins.
pub fn project(list: &[CatalogEntry]) -> Map<String, Value> {
    let mut mapping = Map::new();
    for entry in list {
        mapping.insert(entry.name.clone(), Value::String(entry.value.clone()));
    }
    mapping
}

/// Build a list from a mapping, in mapping order.
pub fn from_mapping(mapping: &Map<String, Value>) -> Vec<CatalogEntry> {
    mapping.iter().map(|(name, value)| CatalogEntry::new(name.clone(), value_text(value))).collect()
}
