use thiserror::Error;

use crate::db::DatabaseError;
use crate::google::GoogleError;
use crate::pipeline::table::TableError;

#[derive(Error, Debug)]
pub enum RejectError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Google API error: {0}")]
    Google(#[from] GoogleError),

    #[error("Metadata table error: {0}")]
    Table(#[from] TableError),

    #[error("No spec found for document {0}")]
    SpecNotFound(String),

    #[error("Cell ({row}, {column}) out of bounds")]
    OutOfBounds { row: usize, column: usize },

    #[error("Table cell is empty or malformed: {0}")]
    MalformedCell(String),

    #[error("No changelog table found")]
    NoChangelog,

    #[error("Changelog table is missing required column: {0}")]
    ChangelogColumnMissing(&'static str),

    #[error("Changelog table not found at element {0} after row insertion")]
    ChangelogMoved(usize),
}

impl RejectError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Google(e) if e.is_transient())
    }
}
