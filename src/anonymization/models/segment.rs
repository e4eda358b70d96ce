//! Normalized segment data model

use serde::Serialize;
use std::fmt;

/// Separator inserted between pages when a paged document is flattened
///
/// Fixed width, so page boundaries can be recovered from cumulative lengths.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Offset table mapping flat-text offsets back to page numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMap {
    /// Byte offset where each page starts in the flattened text
    starts: Vec<usize>,
}

impl PageMap {
    /// Map for a document with a single page
    pub fn single() -> Self {
        Self { starts: vec![0] }
    }

    /// Build the map from each page's byte length, joined with [`PAGE_SEPARATOR`]
    pub fn from_page_lengths<I>(lengths: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut starts = Vec::new();
        let mut offset = 0;
        for (idx, len) in lengths.into_iter().enumerate() {
            if idx > 0 {
                offset += PAGE_SEPARATOR.len();
            }
            starts.push(offset);
            offset += len;
        }
        if starts.is_empty() {
            starts.push(0);
        }
        Self { starts }
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.starts.len()
    }

    /// 1-based page number containing `offset`
    ///
    /// Offsets inside a separator belong to the page before it.
    pub fn page_for_offset(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset).max(1)
    }
}

/// Locator of a segment within the caller's structured input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// One tabular cell
    Cell {
        /// Zero-based data row index (header excluded)
        row: usize,
        /// Zero-based column index; identifies the cell even when header
        /// names repeat
        col: usize,
        /// Column name, for display
        column: String,
    },
    /// A whole (possibly paged) document
    Document {
        /// Source label, usually a file name
        source: String,
        /// Page offset table
        pages: PageMap,
    },
}

impl Origin {
    /// Locator for the cell at `row`, `col`
    pub fn cell(row: usize, col: usize, column: impl Into<String>) -> Self {
        Self::Cell {
            row,
            col,
            column: column.into(),
        }
    }

    /// Page number for a flat-text offset, for paged documents
    pub fn page_for_offset(&self, offset: usize) -> Option<usize> {
        match self {
            Self::Cell { .. } => None,
            Self::Document { pages, .. } => Some(pages.page_for_offset(offset)),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell { row, column, .. } => write!(f, "row {row}, column '{column}'"),
            Self::Document { source, .. } => f.write_str(source),
        }
    }
}

/// One atomic unit of input text, processed independently
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedSegment {
    /// Flat text handed to the recognizers
    pub text: String,
    /// Where the text came from
    pub origin: Origin,
}

impl NormalizedSegment {
    /// Create a new segment
    pub fn new(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_map_lookup() {
        // "abc" + "\n\n" + "defg" + "\n\n" + "h"
        let map = PageMap::from_page_lengths([3, 4, 1]);
        assert_eq!(map.page_count(), 3);
        assert_eq!(map.page_for_offset(0), 1);
        assert_eq!(map.page_for_offset(2), 1);
        assert_eq!(map.page_for_offset(4), 1);
        assert_eq!(map.page_for_offset(5), 2);
        assert_eq!(map.page_for_offset(8), 2);
        assert_eq!(map.page_for_offset(11), 3);
    }

    #[test]
    fn test_page_map_empty_input() {
        let map = PageMap::from_page_lengths(std::iter::empty());
        assert_eq!(map.page_count(), 1);
        assert_eq!(map.page_for_offset(10), 1);
    }

    #[test]
    fn test_origin_display() {
        let cell = Origin::cell(3, 1, "email");
        assert_eq!(cell.to_string(), "row 3, column 'email'");
        assert_eq!(cell.page_for_offset(0), None);

        let doc = Origin::Document {
            source: "notes.txt".to_string(),
            pages: PageMap::single(),
        };
        assert_eq!(doc.to_string(), "notes.txt");
        assert_eq!(doc.page_for_offset(100), Some(1));
    }
}
