//! Per-document ingestion: change-skip, export, table parse, upsert.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::error::SyncError;
use super::types::{FileOutcome, SyncConfig, WorkItem};
use crate::db::SpecStore;
use crate::google::query::MIME_TYPE_HTML;
use crate::google::{DriveApi, DriveFile};
use crate::models::Spec;
use crate::pipeline::table::{first_table, parse_metadata, split_doc_name};

fn required_time(
    file: &DriveFile,
    value: Option<DateTime<Utc>>,
    field: &'static str,
) -> Result<DateTime<Utc>, SyncError> {
    value.ok_or_else(|| SyncError::MissingTimestamp {
        file_id: file.id.clone(),
        field,
    })
}

/// Ingest one document.
///
/// Work done after cancellation is observed is discarded before it reaches
/// the store.
pub async fn process_item(
    drive: &dyn DriveApi,
    store: &SpecStore,
    config: &SyncConfig,
    item: &WorkItem,
    token: &CancellationToken,
) -> Result<FileOutcome, SyncError> {
    let file = &item.file;
    let doc_updated_at = required_time(file, file.modified_time, "modifiedTime")?;
    let doc_created_at = required_time(file, file.created_time, "createdTime")?;

    let (name_id, _) = split_doc_name(&file.name);
    if !config.force && !name_id.is_empty() {
        if let Some(stored) = store.doc_updated_at(&name_id)? {
            if stored == doc_updated_at {
                tracing::debug!(spec_id = %name_id, "Spec unchanged since last sync");
                store.touch_synced_at(&name_id, Utc::now())?;
                return Ok(FileOutcome::Skipped);
            }
        }
    }

    let html = drive.export_file(&file.id, MIME_TYPE_HTML).await?;
    if token.is_cancelled() {
        return Err(SyncError::Cancelled);
    }

    let table = first_table(&String::from_utf8_lossy(&html))?;
    tracing::trace!(doc_id = %file.id, rows = table.len(), "Metadata table extracted");
    let meta = parse_metadata(&file.name, &table, config.author_min_length)?;

    let now = Utc::now();
    let spec = Spec {
        id: meta.id,
        title: Some(meta.title).filter(|t| !t.is_empty()),
        status: meta.status,
        authors: meta.authors,
        spec_type: meta.spec_type,
        team: item.folder.name.clone(),
        google_doc_id: file.id.clone(),
        google_doc_name: file.name.clone(),
        google_doc_url: file.web_view_link.clone().unwrap_or_default(),
        google_doc_created_at: doc_created_at,
        google_doc_updated_at: doc_updated_at,
        created_at: now,
        updated_at: now,
        synced_at: now,
    };

    if token.is_cancelled() {
        return Err(SyncError::Cancelled);
    }
    store.upsert(&spec)?;
    tracing::debug!(spec_id = %spec.id, team = %spec.team, "Spec upserted");
    Ok(FileOutcome::Upserted)
}
