//! RejectService — marks long-idle drafts as rejected.
//!
//! Runs sequentially: locate the status cell, rewrite it, record the new
//! status locally, then leave a notice in the changelog table (or a red
//! paragraph at the top of the document when there is no usable changelog).

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::error::RejectError;
use super::locate::locate_status_cell;
use super::mutate::{append_changelog_row, insert_fallback_notice, update_status_cell};
use super::types::*;
use crate::db::SpecStore;
use crate::google::DocsApi;
use crate::models::Spec;

pub struct RejectService {
    docs: Arc<dyn DocsApi>,
    store: Arc<SpecStore>,
    config: RejectConfig,
}

pub fn new_cleanup_id() -> String {
    Uuid::new_v4().to_string()
}

impl RejectService {
    pub fn new(docs: Arc<dyn DocsApi>, store: Arc<SpecStore>, config: RejectConfig) -> Self {
        Self {
            docs,
            store,
            config,
        }
    }

    /// Records with a draft-like status whose document has not changed
    /// within the configured window.
    pub fn find_stale_specs(&self) -> Result<Vec<Spec>, RejectError> {
        let cutoff = Utc::now() - Duration::days(self.config.stale_after_days);
        Ok(self.store.find_stale(&self.config.draft_statuses, cutoff)?)
    }

    pub async fn reject_all_stale(
        &self,
        token: &CancellationToken,
    ) -> Result<RejectReport, RejectError> {
        let cleanup_id = new_cleanup_id();
        tracing::info!(
            cleanup_id = %cleanup_id,
            dry_run = self.config.dry_run,
            stale_after_days = self.config.stale_after_days,
            "Starting stale spec rejection"
        );

        let specs = self.find_stale_specs()?;
        let mut report = RejectReport {
            total: specs.len(),
            cleanup_id: cleanup_id.clone(),
            ..Default::default()
        };
        if specs.is_empty() {
            tracing::info!("No stale specs to reject");
            return Ok(report);
        }

        for spec in &specs {
            if token.is_cancelled() {
                report.cancelled = true;
                tracing::warn!("Rejection cancelled");
                break;
            }
            match self.reject_spec(spec, &cleanup_id).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    report.failed += 1;
                    let transient = e.is_transient();
                    if transient {
                        report.transient += 1;
                    }
                    tracing::error!(
                        spec_id = %spec.id,
                        transient,
                        doc_id = %spec.google_doc_id,
                        error = %e,
                        "Failed to reject spec"
                    );
                }
            }
        }

        tracing::info!(
            cleanup_id = %report.cleanup_id,
            total = report.total,
            rejected = report.rejected,
            not_found = report.not_found,
            failed = report.failed,
            transient = report.transient,
            planned = report.planned,
            "Stale spec rejection finished"
        );
        Ok(report)
    }

    /// Reject the spec stored for one document, with its own cleanup id.
    pub async fn reject_by_doc_id(&self, doc_id: &str) -> Result<RejectOutcome, RejectError> {
        let spec = self
            .store
            .get_by_doc_id(doc_id)?
            .ok_or_else(|| RejectError::SpecNotFound(doc_id.to_string()))?;
        self.reject_spec(&spec, &new_cleanup_id()).await
    }

    pub async fn reject_spec(
        &self,
        spec: &Spec,
        cleanup_id: &str,
    ) -> Result<RejectOutcome, RejectError> {
        let doc_id = spec.google_doc_id.as_str();

        if self.config.dry_run {
            tracing::info!(spec_id = %spec.id, doc_id, "Would reject spec (dry run)");
            return Ok(RejectOutcome::Planned);
        }

        let doc = self.docs.get_document(doc_id).await?;
        let (table, coords) = match locate_status_cell(&doc, &self.config.draft_statuses)? {
            Some(found) => found,
            None => {
                tracing::info!(spec_id = %spec.id, doc_id, "Document status is not a draft, skipping");
                return Ok(RejectOutcome::NotFound);
            }
        };

        update_status_cell(self.docs.as_ref(), doc_id, table, coords, REJECTED_STATUS).await?;
        self.store.update_status(&spec.id, REJECTED_STATUS, Utc::now())?;
        tracing::info!(spec_id = %spec.id, doc_id, "Spec rejected");

        let today = Utc::now().date_naive();
        let notice = match append_changelog_row(self.docs.as_ref(), doc_id, cleanup_id, today).await {
            Ok(()) => NoticeKind::Changelog,
            Err(e) => {
                tracing::debug!(spec_id = %spec.id, error = %e, "No changelog entry, using fallback notice");
                match insert_fallback_notice(self.docs.as_ref(), doc_id, cleanup_id, today).await {
                    Ok(()) => NoticeKind::Fallback,
                    Err(e) => {
                        tracing::error!(
                            spec_id = %spec.id,
                            doc_id,
                            error = %e,
                            "Failed to add fallback rejection notice"
                        );
                        NoticeKind::Missing
                    }
                }
            }
        };

        Ok(RejectOutcome::Rejected { notice })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::google::{Document, GoogleError, Request};
    use crate::pipeline::reject::fixtures::{document, Part};

    /// Serves documents by id and records every batch update.
    ///
    /// An `InsertTableRow` request swaps in the document's `after_row_insert`
    /// version, if one is registered.
    #[derive(Default)]
    struct FakeDocs {
        documents: Mutex<HashMap<String, Document>>,
        after_row_insert: HashMap<String, Document>,
        failing_batches: bool,
        batches: Mutex<Vec<(String, Vec<Request>)>>,
    }

    impl FakeDocs {
        fn with_doc(self, id: &str, doc: Document) -> Self {
            self.documents.lock().unwrap().insert(id.into(), doc);
            self
        }

        fn batches(&self) -> Vec<(String, Vec<Request>)> {
            self.batches.lock().unwrap().clone()
        }

        fn all_requests(&self) -> Vec<Request> {
            self.batches().into_iter().flat_map(|(_, r)| r).collect()
        }
    }

    #[async_trait]
    impl DocsApi for FakeDocs {
        async fn get_document(&self, document_id: &str) -> Result<Document, GoogleError> {
            self.documents
                .lock()
                .unwrap()
                .get(document_id)
                .cloned()
                .ok_or_else(|| GoogleError::Api { status: 404, body: document_id.into() })
        }

        async fn batch_update(
            &self,
            document_id: &str,
            requests: Vec<Request>,
        ) -> Result<(), GoogleError> {
            if self.failing_batches {
                return Err(GoogleError::Api { status: 500, body: "boom".into() });
            }
            let inserts_row = requests.iter().any(|r| matches!(r, Request::InsertTableRow(_)));
            if inserts_row {
                if let Some(next) = self.after_row_insert.get(document_id) {
                    self.documents
                        .lock()
                        .unwrap()
                        .insert(document_id.into(), next.clone());
                }
            }
            self.batches
                .lock()
                .unwrap()
                .push((document_id.to_string(), requests));
            Ok(())
        }
    }

    const META: &[&[&str]] = &[&["Index", "PR001"], &["Status", "Drafting"]];
    const CHANGELOG: &[&[&str]] = &[
        &["Author", "Status", "Date", "Comment"],
        &["Jane Doe", "Drafting", "2023-01-01", "Created"],
    ];
    const CHANGELOG_WITH_NEW_ROW: &[&[&str]] = &[
        &["Author", "Status", "Date", "Comment"],
        &["Jane Doe", "Drafting", "2023-01-01", "Created"],
        &["", "", "", ""],
    ];

    fn long_ago() -> DateTime<Utc> {
        Utc::now() - Duration::days(400)
    }

    fn spec(id: &str, doc_id: &str, status: &str, updated: DateTime<Utc>) -> Spec {
        Spec {
            id: id.into(),
            title: Some("A spec".into()),
            status: Some(status.into()),
            authors: vec!["Jane Doe".into()],
            spec_type: None,
            team: "Platform".into(),
            google_doc_id: doc_id.into(),
            google_doc_name: format!("{id} - A spec"),
            google_doc_url: String::new(),
            google_doc_created_at: updated,
            google_doc_updated_at: updated,
            created_at: updated,
            updated_at: updated,
            synced_at: Utc::now(),
        }
    }

    fn config(dry_run: bool) -> RejectConfig {
        RejectConfig {
            stale_after_days: 180,
            draft_statuses: vec!["drafting".into(), "braindump".into()],
            dry_run,
        }
    }

    fn service(docs: FakeDocs, dry_run: bool) -> (RejectService, Arc<FakeDocs>, Arc<SpecStore>) {
        let docs = Arc::new(docs);
        let store = Arc::new(SpecStore::open_in_memory().unwrap());
        let svc = RejectService::new(docs.clone(), store.clone(), config(dry_run));
        (svc, docs, store)
    }

    #[tokio::test]
    async fn dry_run_changes_nothing() {
        let docs = FakeDocs::default().with_doc("d1", document(&[Part::Table(META)]));
        let (svc, docs, store) = service(docs, true);
        store.upsert(&spec("PR001", "d1", "Drafting", long_ago())).unwrap();

        let report = svc.reject_all_stale(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.planned, 1);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.failed, 0);
        assert!(docs.batches().is_empty());
        assert_eq!(store.get("PR001").unwrap().unwrap().status.as_deref(), Some("Drafting"));
    }

    #[tokio::test]
    async fn missing_changelog_falls_back_to_notice() {
        let docs = FakeDocs::default().with_doc("d1", document(&[Part::Table(META)]));
        let (svc, docs, store) = service(docs, false);
        let s = spec("PR001", "d1", "Drafting", long_ago());
        store.upsert(&s).unwrap();

        let outcome = svc.reject_spec(&s, "cleanup-1").await.unwrap();
        assert_eq!(outcome, RejectOutcome::Rejected { notice: NoticeKind::Fallback });

        let batches = docs.batches();
        assert_eq!(batches.len(), 2);
        assert!(matches!(batches[0].1[1], Request::InsertText(ref t) if t.text == "Rejected"));
        match &batches[1].1[0] {
            Request::InsertText(t) => {
                assert_eq!(t.location.index, 1);
                assert!(t.text.contains("Cleanup ID: cleanup-1"));
            }
            other => panic!("unexpected request {other:?}"),
        }
        assert!(!docs
            .all_requests()
            .iter()
            .any(|r| matches!(r, Request::InsertTableRow(_))));
        assert_eq!(store.get("PR001").unwrap().unwrap().status.as_deref(), Some("Rejected"));
    }

    #[tokio::test]
    async fn changelog_row_appended() {
        let before = document(&[
            Part::Table(META),
            Part::Text("Spec History and Changelog"),
            Part::Table(CHANGELOG),
        ]);
        let after = document(&[
            Part::Table(META),
            Part::Text("Spec History and Changelog"),
            Part::Table(CHANGELOG_WITH_NEW_ROW),
        ]);
        let changelog_start = before.body.content[3].start_index;

        let mut docs = FakeDocs::default().with_doc("d1", before);
        docs.after_row_insert.insert("d1".into(), after);
        let (svc, docs, store) = service(docs, false);
        let s = spec("PR001", "d1", "Drafting", long_ago());
        store.upsert(&s).unwrap();

        let outcome = svc.reject_spec(&s, "cleanup-2").await.unwrap();
        assert_eq!(outcome, RejectOutcome::Rejected { notice: NoticeKind::Changelog });

        let batches = docs.batches();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[1].1, vec![Request::insert_row_below(changelog_start, 1)]);

        let texts: Vec<&str> = batches[2]
            .1
            .iter()
            .filter_map(|r| match r {
                Request::InsertText(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 4);
        assert_eq!(texts[0], "Specs Automations");
        assert_eq!(texts[1], "Rejected");
        assert_eq!(texts[2], Utc::now().date_naive().format(DATE_FORMAT).to_string());
        assert!(texts[3].contains("cleanup-2"));
    }

    #[tokio::test]
    async fn non_draft_document_is_not_found() {
        let docs = FakeDocs::default().with_doc(
            "d1",
            document(&[Part::Table(&[&["Index", "PR001"], &["Status", "Approved"]])]),
        );
        let (svc, docs, store) = service(docs, false);
        store.upsert(&spec("PR001", "d1", "Drafting", long_ago())).unwrap();

        let report = svc.reject_all_stale(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.not_found, 1);
        assert_eq!(report.failed, 0);
        assert!(docs.batches().is_empty());
        assert_eq!(store.get("PR001").unwrap().unwrap().status.as_deref(), Some("Drafting"));
    }

    #[tokio::test]
    async fn only_old_drafts_selected() {
        let (svc, _, store) = service(FakeDocs::default(), true);
        store.upsert(&spec("OLD", "d1", "drafting", long_ago())).unwrap();
        store.upsert(&spec("BRAIN", "d2", "Braindump", long_ago())).unwrap();
        store.upsert(&spec("FRESH", "d3", "Drafting", Utc::now())).unwrap();
        store.upsert(&spec("DONE", "d4", "Approved", long_ago())).unwrap();

        let mut ids: Vec<String> = svc.find_stale_specs().unwrap().into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["BRAIN", "OLD"]);
    }

    #[tokio::test]
    async fn failures_counted_and_batch_continues() {
        let docs = FakeDocs::default().with_doc("d2", document(&[Part::Table(META)]));
        let (svc, _, store) = service(docs, false);
        store.upsert(&spec("MISSING", "d1", "Drafting", long_ago())).unwrap();
        store.upsert(&spec("PR001", "d2", "Drafting", long_ago())).unwrap();

        let report = svc.reject_all_stale(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.transient, 0);
        assert_eq!(report.rejected, 1);
    }

    #[tokio::test]
    async fn server_errors_counted_as_transient() {
        let mut docs = FakeDocs::default().with_doc("d1", document(&[Part::Table(META)]));
        docs.failing_batches = true;
        let (svc, _, store) = service(docs, false);
        store.upsert(&spec("PR001", "d1", "Drafting", long_ago())).unwrap();

        let report = svc.reject_all_stale(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.transient, 1);
    }

    #[tokio::test]
    async fn failed_status_update_leaves_store_untouched() {
        let mut docs = FakeDocs::default().with_doc("d1", document(&[Part::Table(META)]));
        docs.failing_batches = true;
        let (svc, _, store) = service(docs, false);
        let s = spec("PR001", "d1", "Drafting", long_ago());
        store.upsert(&s).unwrap();

        assert!(matches!(svc.reject_spec(&s, "c").await, Err(RejectError::Google(_))));
        assert_eq!(store.get("PR001").unwrap().unwrap().status.as_deref(), Some("Drafting"));
    }

    #[tokio::test]
    async fn reject_by_unknown_doc_id() {
        let (svc, _, _) = service(FakeDocs::default(), false);
        assert!(matches!(
            svc.reject_by_doc_id("nope").await,
            Err(RejectError::SpecNotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn reject_by_doc_id_uses_stored_spec() {
        let docs = FakeDocs::default().with_doc("d1", document(&[Part::Table(META)]));
        let (svc, _, store) = service(docs, false);
        store.upsert(&spec("PR001", "d1", "Drafting", Utc::now())).unwrap();

        let outcome = svc.reject_by_doc_id("d1").await.unwrap();
        assert!(matches!(outcome, RejectOutcome::Rejected { .. }));
        assert_eq!(store.get("PR001").unwrap().unwrap().status.as_deref(), Some("Rejected"));
    }

    #[tokio::test]
    async fn cancelled_batch_stops_before_first_spec() {
        let docs = FakeDocs::default().with_doc("d1", document(&[Part::Table(META)]));
        let (svc, docs, store) = service(docs, false);
        store.upsert(&spec("PR001", "d1", "Drafting", long_ago())).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let report = svc.reject_all_stale(&token).await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.rejected, 0);
        assert!(docs.batches().is_empty());
    }

    #[test]
    fn cleanup_ids_are_unique_uuids() {
        let a = new_cleanup_id();
        assert_ne!(a, new_cleanup_id());
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
