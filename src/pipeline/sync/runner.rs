//! SyncService — streams team folders and documents into a worker pool.
//!
//! A single producer pages through the root folder's subfolders and each
//! subfolder's documents, feeding a bounded queue. A fixed set of workers
//! drains the queue. Records not refreshed by a complete traversal are
//! deleted at the end of the run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use super::error::SyncError;
use super::types::*;
use super::worker::process_item;
use crate::db::SpecStore;
use crate::google::query::{documents_query, subfolders_query};
use crate::google::{file_stream, DriveApi};

struct SyncContext {
    drive: Arc<dyn DriveApi>,
    store: Arc<SpecStore>,
    config: SyncConfig,
    counters: SyncCounters,
}

pub struct SyncService {
    drive: Arc<dyn DriveApi>,
    store: Arc<SpecStore>,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(drive: Arc<dyn DriveApi>, store: Arc<SpecStore>, config: SyncConfig) -> Self {
        Self {
            drive,
            store,
            config,
        }
    }

    /// Run one traversal with the configured `force` setting.
    pub async fn sync_specs(&self, token: &CancellationToken) -> Result<SyncReport, SyncError> {
        self.run(token, self.config.force).await
    }

    pub async fn run(&self, token: &CancellationToken, force: bool) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let workers = self.config.max_workers.max(1);

        tracing::info!(
            root_folder_id = %self.config.root_folder_id,
            workers,
            force,
            "Starting spec sync"
        );

        let ctx = Arc::new(SyncContext {
            drive: Arc::clone(&self.drive),
            store: Arc::clone(&self.store),
            config: SyncConfig {
                force,
                ..self.config.clone()
            },
            counters: SyncCounters::default(),
        });

        let (tx, rx) = mpsc::channel::<WorkItem>(workers);
        let rx = Arc::new(Mutex::new(rx));

        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&rx),
                    Arc::clone(&ctx),
                    token.clone(),
                ))
            })
            .collect();

        produce(&ctx, tx, token).await;

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Sync worker panicked");
            }
        }

        let cancelled = token.is_cancelled();
        let mut report = ctx.counters.report(0, cancelled, start.elapsed());

        if report.is_complete() {
            report.deleted = self.store.delete_synced_before(started_at)?;
        } else {
            tracing::warn!(
                cancelled,
                listing_errors = report.listing_errors,
                "Traversal incomplete, skipping removal of unvisited specs"
            );
        }
        report.duration = start.elapsed();

        tracing::info!(
            total = report.total,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            transient = report.transient,
            deleted = report.deleted,
            cancelled = report.cancelled,
            duration_ms = report.duration.as_millis() as u64,
            "Spec sync finished"
        );
        Ok(report)
    }
}

/// Feed every document under every team folder into the queue.
///
/// Dropping `tx` on return closes the queue.
async fn produce(ctx: &SyncContext, tx: mpsc::Sender<WorkItem>, token: &CancellationToken) {
    let mut folders = file_stream(
        Arc::clone(&ctx.drive),
        subfolders_query(&ctx.config.root_folder_id),
    );

    loop {
        let next = tokio::select! {
            _ = token.cancelled() => return,
            next = folders.next() => next,
        };
        let folder = match next {
            None => return,
            Some(Ok(folder)) => folder,
            Some(Err(e)) => {
                tracing::error!(error = %e, "Failed to list team folders");
                SyncCounters::incr(&ctx.counters.listing_errors);
                return;
            }
        };

        tracing::debug!(folder_name = %folder.name, folder_id = %folder.id, "Listing team folder");
        let mut files = file_stream(Arc::clone(&ctx.drive), documents_query(&folder.id));

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => return,
                next = files.next() => next,
            };
            let file = match next {
                None => break,
                Some(Ok(file)) => file,
                Some(Err(e)) => {
                    tracing::error!(folder_name = %folder.name, error = %e, "Failed to list documents");
                    SyncCounters::incr(&ctx.counters.listing_errors);
                    break;
                }
            };

            SyncCounters::incr(&ctx.counters.total);
            let item = WorkItem {
                file,
                folder: folder.clone(),
            };
            let sent = tokio::select! {
                _ = token.cancelled() => return,
                sent = tx.send(item) => sent,
            };
            if sent.is_err() {
                return;
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    ctx: Arc<SyncContext>,
    token: CancellationToken,
) {
    loop {
        let item = {
            let mut rx = rx.lock().await;
            tokio::select! {
                _ = token.cancelled() => None,
                item = rx.recv() => item,
            }
        };
        let Some(item) = item else { break };

        let result = tokio::select! {
            _ = token.cancelled() => Err(SyncError::Cancelled),
            result = process_item(ctx.drive.as_ref(), &ctx.store, &ctx.config, &item, &token) => result,
        };

        match result {
            Ok(FileOutcome::Upserted) => SyncCounters::incr(&ctx.counters.processed),
            Ok(FileOutcome::Skipped) => SyncCounters::incr(&ctx.counters.skipped),
            Err(SyncError::Cancelled) => break,
            Err(e) => {
                SyncCounters::incr(&ctx.counters.failed);
                let transient = e.is_transient();
                if transient {
                    SyncCounters::incr(&ctx.counters.transient);
                }
                tracing::warn!(
                    worker_id,
                    transient,
                    doc_id = %item.file.id,
                    doc_name = %item.file.name,
                    team = %item.folder.name,
                    error = %e,
                    "Failed to sync spec"
                );
            }
        }
    }
    tracing::trace!(worker_id, "Sync worker stopped");
}
