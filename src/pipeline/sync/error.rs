use thiserror::Error;

use crate::db::DatabaseError;
use crate::google::GoogleError;
use crate::pipeline::table::TableError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Google API error: {0}")]
    Google(#[from] GoogleError),

    #[error("Metadata table error: {0}")]
    Table(#[from] TableError),

    #[error("Drive file {file_id} has no {field}")]
    MissingTimestamp { file_id: String, field: &'static str },

    #[error("Sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Failures a later run may not hit again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Google(e) if e.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_google_errors_are_transient() {
        assert!(SyncError::from(GoogleError::Connection("drive".into())).is_transient());
        assert!(!SyncError::from(GoogleError::Api { status: 404, body: String::new() }).is_transient());
        assert!(!SyncError::Table(TableError::NotFound).is_transient());
    }
}
