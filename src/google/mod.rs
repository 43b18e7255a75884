//! Google Drive and Google Docs collaborators.
//!
//! The pipelines only see the `DriveApi` and `DocsApi` traits. `GoogleClient`
//! is the HTTP implementation; tests substitute in-memory fakes.

pub mod client;
pub mod docs;
pub mod drive;
pub mod query;

pub use client::GoogleClient;
pub use docs::*;
pub use drive::*;
pub use query::QueryBuilder;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoogleError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Cannot connect to Google API at {0}")]
    Connection(String),

    #[error("Google API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

impl GoogleError {
    /// Network and quota failures worth retrying on a later run.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpClient(_) | Self::Connection(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::ResponseParsing(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_and_server_errors_are_transient() {
        assert!(GoogleError::Api { status: 429, body: String::new() }.is_transient());
        assert!(GoogleError::Api { status: 503, body: String::new() }.is_transient());
        assert!(!GoogleError::Api { status: 404, body: String::new() }.is_transient());
        assert!(!GoogleError::ResponseParsing("bad".into()).is_transient());
    }
}
