use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::docs::{BatchUpdateBody, DocsApi, Document, Request};
use super::drive::{DriveApi, FilePage, FILE_LIST_FIELDS};
use super::GoogleError;

pub const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DOCS_BASE_URL: &str = "https://docs.googleapis.com/v1";

/// HTTP client for the Drive v3 and Docs v1 REST APIs.
pub struct GoogleClient {
    client: reqwest::Client,
    access_token: String,
    drive_base_url: String,
    docs_base_url: String,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct AboutResponse {
    user: AboutUser,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboutUser {
    #[serde(default)]
    email_address: String,
}

impl GoogleClient {
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self, GoogleError> {
        Self::with_base_urls(access_token, DRIVE_BASE_URL, DOCS_BASE_URL, timeout_secs)
    }

    pub fn with_base_urls(
        access_token: &str,
        drive_base_url: &str,
        docs_base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, GoogleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GoogleError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            access_token: access_token.to_string(),
            drive_base_url: drive_base_url.trim_end_matches('/').to_string(),
            docs_base_url: docs_base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    /// Connectivity check. Returns the authenticated account's email.
    pub async fn verify(&self) -> Result<String, GoogleError> {
        let url = format!("{}/about", self.drive_base_url);
        let response = self
            .send(self.client.get(&url).query(&[("fields", "user")]), &url)
            .await?;
        let about: AboutResponse = parse_json(response).await?;
        tracing::info!(account = %about.user.email_address, "Google API connection verified");
        Ok(about.user.email_address)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, GoogleError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GoogleError::Connection(url.to_string())
                } else if e.is_timeout() {
                    GoogleError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    GoogleError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GoogleError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GoogleError> {
    response
        .json()
        .await
        .map_err(|e| GoogleError::ResponseParsing(e.to_string()))
}

#[async_trait]
impl DriveApi for GoogleClient {
    async fn list_files(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FilePage, GoogleError> {
        let url = format!("{}/files", self.drive_base_url);
        let mut params = vec![
            ("q", query),
            ("fields", FILE_LIST_FIELDS),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self.send(self.client.get(&url).query(&params), &url).await?;
        parse_json(response).await
    }

    async fn export_file(&self, file_id: &str, mime_type: &str) -> Result<Vec<u8>, GoogleError> {
        let url = format!("{}/files/{}/export", self.drive_base_url, file_id);
        let response = self
            .send(self.client.get(&url).query(&[("mimeType", mime_type)]), &url)
            .await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GoogleError::HttpClient(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DocsApi for GoogleClient {
    async fn get_document(&self, document_id: &str) -> Result<Document, GoogleError> {
        let url = format!("{}/documents/{}", self.docs_base_url, document_id);
        let response = self.send(self.client.get(&url), &url).await?;
        parse_json(response).await
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Request>,
    ) -> Result<(), GoogleError> {
        let url = format!("{}/documents/{}:batchUpdate", self.docs_base_url, document_id);
        let body = BatchUpdateBody { requests: &requests };
        self.send(self.client.post(&url).json(&body), &url).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_trimmed() {
        let client =
            GoogleClient::with_base_urls("tok", "http://drive.local/", "http://docs.local//", 5)
                .unwrap();
        assert_eq!(client.drive_base_url, "http://drive.local");
        assert_eq!(client.docs_base_url, "http://docs.local");
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        let client =
            GoogleClient::with_base_urls("tok", "http://127.0.0.1:1", "http://127.0.0.1:1", 2)
                .unwrap();
        let err = client.list_files("q", None).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn about_response_parses() {
        let about: AboutResponse =
            serde_json::from_str(r#"{"user": {"emailAddress": "bot@example.com"}}"#).unwrap();
        assert_eq!(about.user.email_address, "bot@example.com");
    }
}
