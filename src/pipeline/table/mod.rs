//! Metadata table extraction and interpretation.
//!
//! A spec document carries its metadata in the first table of the document.
//! Two historical layouts exist; `MetadataTable::classify` decides which one
//! a grid uses and is shared by the ingestion parser and the reject locator.

pub mod extract;
pub mod layout;
pub mod parse;

pub use extract::first_table;
pub use layout::{CellCoordinates, Field, MetadataTable};
pub use parse::{parse_authors, parse_metadata, split_doc_name, SpecMetadata};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("No table found in document")]
    NotFound,

    #[error("Metadata table has no data")]
    Empty,

    #[error("Spec identifier missing from document name and metadata table")]
    MissingIdentifier,

    #[error("Invalid selector {selector}: {reason}")]
    Selector { selector: String, reason: String },
}

/// Immutable grid of trimmed cell strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, at: CellCoordinates) -> Option<&str> {
        self.rows.get(at.row)?.get(at.column).map(String::as_str)
    }
}

impl From<Vec<Vec<&str>>> for RawTable {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_lookup_out_of_bounds_is_none() {
        let table = RawTable::from(vec![vec!["status", "Drafting"]]);
        assert_eq!(table.cell(CellCoordinates { row: 0, column: 1 }), Some("Drafting"));
        assert_eq!(table.cell(CellCoordinates { row: 0, column: 2 }), None);
        assert_eq!(table.cell(CellCoordinates { row: 3, column: 0 }), None);
    }
}
