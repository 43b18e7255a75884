//! Ingestion pipeline: Drive folders to spec records.

pub mod error;
pub mod runner;
pub mod types;
pub mod worker;

pub use error::SyncError;
pub use runner::SyncService;
pub use types::{FileOutcome, SyncConfig, SyncReport, WorkItem};
