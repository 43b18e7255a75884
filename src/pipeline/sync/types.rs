use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::config::{Config, ConfigError};
use crate::google::DriveFile;

/// One document to ingest, paired with the team folder it was listed under.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub file: DriveFile,
    pub folder: DriveFile,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub root_folder_id: String,
    pub max_workers: usize,
    /// Re-extract every document even when its modified time is unchanged.
    pub force: bool,
    pub author_min_length: usize,
}

impl SyncConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            root_folder_id: config.root_folder()?.to_string(),
            max_workers: config.sync_max_workers.max(1),
            force: false,
            author_min_length: config.author_min_length,
        })
    }
}

/// Per-document result of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Upserted,
    Skipped,
}

#[derive(Debug, Default)]
pub(crate) struct SyncCounters {
    pub total: AtomicUsize,
    pub processed: AtomicUsize,
    pub skipped: AtomicUsize,
    pub failed: AtomicUsize,
    pub transient: AtomicUsize,
    pub listing_errors: AtomicUsize,
}

impl SyncCounters {
    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self, deleted: usize, cancelled: bool, duration: Duration) -> SyncReport {
        SyncReport {
            total: self.total.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            transient: self.transient.load(Ordering::Relaxed),
            deleted,
            cancelled,
            listing_errors: self.listing_errors.load(Ordering::Relaxed),
            duration,
        }
    }
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    /// Documents handed to workers.
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Subset of `failed` caused by network or quota errors.
    pub transient: usize,
    /// Records removed because the traversal no longer found them.
    pub deleted: usize,
    pub cancelled: bool,
    pub listing_errors: usize,
    pub duration: Duration,
}

impl SyncReport {
    /// A traversal that saw every listing through without cancellation.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.listing_errors == 0
    }
}
