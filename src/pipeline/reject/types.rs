use serde::Serialize;

use crate::config::Config;
use crate::google::RgbColor;

/// Status written into rejected documents and records.
pub const REJECTED_STATUS: &str = "Rejected";
/// Author column value of changelog rows added by the cleanup.
pub const AUTOMATION_AUTHOR: &str = "Specs Automations";
pub const NOTICE_COLOR: RgbColor = RgbColor {
    red: 0.8,
    green: 0.2,
    blue: 0.2,
};
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct RejectConfig {
    pub stale_after_days: i64,
    /// Lowercase statuses considered draft-like.
    pub draft_statuses: Vec<String>,
    pub dry_run: bool,
}

impl RejectConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            stale_after_days: config.stale_after_days,
            draft_statuses: config.draft_statuses.clone(),
            dry_run: false,
        }
    }
}

/// Column indices of the changelog table, by header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangelogColumns {
    pub author: usize,
    pub status: usize,
    pub date: usize,
    pub comment: usize,
}

impl ChangelogColumns {
    pub fn max_index(&self) -> usize {
        self.author.max(self.status).max(self.date).max(self.comment)
    }
}

/// Where the rejection notice ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Changelog,
    Fallback,
    /// Both notice paths failed; the status change itself stands.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RejectOutcome {
    Rejected { notice: NoticeKind },
    /// Dry run: nothing was changed.
    Planned,
    /// The document's status cell is missing or no longer draft-like.
    NotFound,
}

/// Summary of one rejection batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RejectReport {
    pub total: usize,
    pub rejected: usize,
    pub not_found: usize,
    pub failed: usize,
    /// Subset of `failed` caused by network or quota errors.
    pub transient: usize,
    pub planned: usize,
    pub cancelled: bool,
    pub cleanup_id: String,
}

impl RejectReport {
    pub fn record(&mut self, outcome: RejectOutcome) {
        match outcome {
            RejectOutcome::Rejected { .. } => self.rejected += 1,
            RejectOutcome::Planned => self.planned += 1,
            RejectOutcome::NotFound => self.not_found += 1,
        }
    }
}
