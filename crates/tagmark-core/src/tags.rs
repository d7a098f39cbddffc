//! Tag intake and the reconciliation ledger.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::MarkError;

/// Column carrying the tags when the caller does not name one.
pub const DEFAULT_TAG_COLUMN: &str = "Tags";

/// A decoded spreadsheet: column headers plus row-major cells.
///
/// Decoding the sheet file itself lives outside the engine; callers hand
/// over the table they read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TagSheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        TagSheet { headers, rows }
    }

    /// Ordered tag values from `column`. Blank cells are dropped; order and
    /// duplicates are otherwise preserved.
    pub fn tag_column(&self, column: &str) -> Result<Vec<String>, MarkError> {
        let index = self
            .headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| MarkError::TagColumnMissing(column.to_string()))?;

        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(index))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Reconciliation value carried across pages: the ordered tag list and the
/// monotonically growing found set. Not-found is always the complement.
#[derive(Debug, Clone, Default)]
pub struct TagLedger {
    tags: Vec<String>,
    known: HashSet<String>,
    found: HashSet<String>,
}

impl TagLedger {
    /// Builds a ledger from the tag source, keeping first occurrences only.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known = HashSet::new();
        let mut ordered = Vec::new();
        for tag in tags {
            let tag = tag.into();
            if known.insert(tag.clone()) {
                ordered.push(tag);
            }
        }
        TagLedger {
            tags: ordered,
            known,
            found: HashSet::new(),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Records `tag` as found. Values outside the tag source are ignored.
    /// Returns true the first time a source tag is recorded.
    pub fn mark_found(&mut self, tag: &str) -> bool {
        if !self.known.contains(tag) {
            return false;
        }
        self.found.insert(tag.to_string())
    }

    pub fn is_found(&self, tag: &str) -> bool {
        self.found.contains(tag)
    }

    pub fn found_count(&self) -> usize {
        self.found.len()
    }

    /// Found tags in tag-source order.
    pub fn found_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| self.found.contains(*t))
            .cloned()
            .collect()
    }

    /// Tags never found, in tag-source order.
    pub fn missing_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| !self.found.contains(*t))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet() -> TagSheet {
        TagSheet::new(
            vec!["Id".to_string(), "Tags".to_string()],
            vec![
                vec!["1".to_string(), "12-L-3456".to_string()],
                vec!["2".to_string(), "  ".to_string()],
                vec!["3".to_string(), "AB-9999".to_string()],
                vec!["4".to_string()],
                vec!["5".to_string(), "12-L-3456".to_string()],
            ],
        )
    }

    #[test]
    fn test_tag_column_drops_blank_cells_keeps_order() {
        let tags = sheet().tag_column("Tags").unwrap();
        assert_eq!(
            tags,
            vec![
                "12-L-3456".to_string(),
                "AB-9999".to_string(),
                "12-L-3456".to_string()
            ]
        );
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let err = sheet().tag_column("Tag").unwrap_err();
        assert!(matches!(err, MarkError::TagColumnMissing(col) if col == "Tag"));
    }

    #[test]
    fn test_ledger_dedups_on_intake() {
        let ledger = TagLedger::new(["a", "b", "a", "c", "b"]);
        assert_eq!(ledger.tags(), &["a", "b", "c"]);
    }

    #[test]
    fn test_mark_found_partitions_in_source_order() {
        let mut ledger = TagLedger::new(["a", "b", "c"]);
        assert!(ledger.mark_found("c"));
        assert!(ledger.mark_found("a"));
        assert_eq!(ledger.found_tags(), vec!["a".to_string(), "c".to_string()]);
        assert_eq!(ledger.missing_tags(), vec!["b".to_string()]);
    }

    #[test]
    fn test_mark_found_is_idempotent_and_ignores_strays() {
        let mut ledger = TagLedger::new(["a"]);
        assert!(ledger.mark_found("a"));
        assert!(!ledger.mark_found("a"));
        assert!(!ledger.mark_found("zz"));
        assert_eq!(ledger.found_tags(), vec!["a".to_string()]);
        assert!(ledger.missing_tags().is_empty());
    }
}
