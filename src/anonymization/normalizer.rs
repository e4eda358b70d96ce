//! Segment normalizer
//!
//! Turns structured input into flat [`NormalizedSegment`]s. Tables yield one
//! segment per non-blank cell; paged documents are joined with
//! [`PAGE_SEPARATOR`] and carry a [`PageMap`] so offsets map back to pages.

use crate::anonymization::models::{NormalizedSegment, Origin, PageMap, PAGE_SEPARATOR};
use serde::Serialize;

/// In-memory table: a header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Column names from the header row
    pub columns: Vec<String>,
    /// Data rows; a short row is padded with empty cells
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Display name for column `col`; cells past the header are named by
    /// their 1-based position
    pub fn column_name(&self, col: usize) -> String {
        self.columns
            .get(col)
            .cloned()
            .unwrap_or_else(|| format!("column_{}", col + 1))
    }

    /// Cell value under the first column named `column`, if present
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Maps raw input units to normalized segments
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentNormalizer;

impl SegmentNormalizer {
    /// One segment per non-blank cell, in row-major order
    ///
    /// Every cell of a row is scanned, including cells past the header width.
    pub fn normalize_table(&self, table: &Table) -> Vec<NormalizedSegment> {
        let mut segments = Vec::new();

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if value.trim().is_empty() {
                    continue;
                }
                segments.push(NormalizedSegment::new(
                    value.clone(),
                    Origin::cell(row_idx, col_idx, table.column_name(col_idx)),
                ));
            }
        }

        tracing::debug!(
            rows = table.rows.len(),
            columns = table.columns.len(),
            segments = segments.len(),
            "Normalized table"
        );

        segments
    }

    /// Join pages into one segment with a page map
    ///
    /// Blank pages keep their slot so page numbers stay stable; a document
    /// whose pages are all blank yields nothing.
    pub fn normalize_pages<S: AsRef<str>>(
        &self,
        source: &str,
        pages: &[S],
    ) -> Option<NormalizedSegment> {
        if pages.iter().all(|page| page.as_ref().trim().is_empty()) {
            tracing::debug!(source = %source, "Skipping blank document");
            return None;
        }

        let text = pages
            .iter()
            .map(|page| page.as_ref())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);
        let map = PageMap::from_page_lengths(pages.iter().map(|page| page.as_ref().len()));

        Some(NormalizedSegment::new(
            text,
            Origin::Document {
                source: source.to_string(),
                pages: map,
            },
        ))
    }

    /// Single-page document
    pub fn normalize_document(&self, source: &str, text: &str) -> Option<NormalizedSegment> {
        self.normalize_pages(source, &[text])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["name".into(), "email".into(), "id".into()],
            vec![
                vec!["John".into(), "john.doe@company.com".into(), "223j1ao5g".into()],
                vec!["Jane".into(), "   ".into(), "".into()],
                vec!["Short".into()],
            ],
        )
    }

    #[test]
    fn test_table_skips_blank_cells() {
        let segments = SegmentNormalizer.normalize_table(&table());

        let origins: Vec<String> = segments.iter().map(|s| s.origin.to_string()).collect();
        assert_eq!(
            origins,
            vec![
                "row 0, column 'name'",
                "row 0, column 'email'",
                "row 0, column 'id'",
                "row 1, column 'name'",
                "row 2, column 'name'",
            ]
        );
        assert_eq!(segments[1].text, "john.doe@company.com");
    }

    #[test]
    fn test_table_scans_cells_past_header() {
        let table = Table::new(
            vec!["name".into()],
            vec![vec!["alice".into(), "bob@example.com".into()]],
        );

        let segments = SegmentNormalizer.normalize_table(&table);

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "bob@example.com");
        assert_eq!(segments[1].origin, Origin::cell(0, 1, "column_2"));
    }

    #[test]
    fn test_duplicate_headers_get_distinct_origins() {
        let table = Table::new(
            vec!["email".into(), "email".into()],
            vec![vec!["a@example.com".into(), "hello".into()]],
        );

        let segments = SegmentNormalizer.normalize_table(&table);

        assert_eq!(segments[0].origin, Origin::cell(0, 0, "email"));
        assert_eq!(segments[1].origin, Origin::cell(0, 1, "email"));
        assert_ne!(segments[0].origin, segments[1].origin);
    }

    #[test]
    fn test_pages_joined_with_separator() {
        let segment = SegmentNormalizer
            .normalize_pages("report.pdf", &["first page", "", "third"])
            .unwrap();

        assert_eq!(segment.text, "first page\n\n\n\nthird");
        let third = segment.text.find("third").unwrap();
        assert_eq!(segment.origin.page_for_offset(third), Some(3));
        assert_eq!(segment.origin.page_for_offset(0), Some(1));
    }

    #[test]
    fn test_blank_document_emits_nothing() {
        assert!(SegmentNormalizer.normalize_document("a.txt", "  \n ").is_none());
        assert!(SegmentNormalizer
            .normalize_pages::<&str>("b.pdf", &["", " "])
            .is_none());
        assert!(SegmentNormalizer
            .normalize_pages::<&str>("c.pdf", &[])
            .is_none());
    }

    #[test]
    fn test_table_cell_lookup() {
        let table = table();
        assert_eq!(table.cell(0, "id"), Some("223j1ao5g"));
        assert_eq!(table.cell(2, "email"), None);
        assert_eq!(table.cell(0, "missing"), None);
    }
}
