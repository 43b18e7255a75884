use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked spec document, normalized from its metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub id: String,
    pub title: Option<String>,
    pub status: Option<String>,
    pub authors: Vec<String>,
    pub spec_type: Option<String>,
    pub team: String,
    pub google_doc_id: String,
    pub google_doc_name: String,
    pub google_doc_url: String,
    pub google_doc_created_at: DateTime<Utc>,
    pub google_doc_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced_at: DateTime<Utc>,
}

/// Page of specs returned by the list query.
#[derive(Debug, Clone, Serialize)]
pub struct SpecPage {
    pub total: i64,
    pub specs: Vec<Spec>,
    pub limit: u32,
    pub offset: u32,
}
