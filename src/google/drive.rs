//! Drive file listing and export.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use super::GoogleError;

/// Fields requested for every file listing page.
pub const FILE_LIST_FIELDS: &str =
    "nextPageToken, files(id, name, mimeType, createdTime, modifiedTime, webViewLink)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Drive operations used by the sync pipeline.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// One page of files matching the `q` expression, across all drives.
    async fn list_files(&self, query: &str, page_token: Option<&str>)
        -> Result<FilePage, GoogleError>;

    /// Export a Google-native file in the given MIME type.
    async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, GoogleError>;
}

enum PageCursor {
    First,
    Next(String),
    Done,
}

/// Lazily page through every file matching `query`.
///
/// The next page is fetched only once the consumer has drained the current
/// one. A listing error is yielded as the final item.
pub fn file_stream(
    drive: Arc<dyn DriveApi>,
    query: String,
) -> BoxStream<'static, Result<DriveFile, GoogleError>> {
    let pages = stream::unfold(PageCursor::First, move |cursor| {
        let drive = Arc::clone(&drive);
        let query = query.clone();
        async move {
            let token = match cursor {
                PageCursor::First => None,
                PageCursor::Next(token) => Some(token),
                PageCursor::Done => return None,
            };
            match drive.list_files(&query, token.as_deref()).await {
                Ok(page) => {
                    let next = match page.next_page_token.filter(|t| !t.is_empty()) {
                        Some(t) => PageCursor::Next(t),
                        None => PageCursor::Done,
                    };
                    Some((Ok(page.files), next))
                }
                Err(e) => Some((Err(e), PageCursor::Done)),
            }
        }
    });

    pages
        .flat_map(|page| {
            let items: Vec<Result<DriveFile, GoogleError>> = match page {
                Ok(files) => files.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        })
        .boxed()
}
