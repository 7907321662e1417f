//! Paginated author directory of the publishing platform

use super::SpreadsheetSource;
use crate::config::DirectoryConfig;
use crate::types::AuthorRow;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Reads author rows page by page from the platform's author directory
///
/// Pages are requested in order starting at 1 until a page comes back empty or
/// `max_pages` pages were read. Directory entries carry no catalog link, so the
/// rows are keyed by their external id.
pub struct DirectorySheet {
    http_client: reqwest::Client,
    config: DirectoryConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageRequest {
    user_id: i64,
    device: i64,
    page: u32,
    limit: u32,
}

#[derive(Deserialize)]
struct PageResponse {
    #[serde(default)]
    authors: Vec<DirectoryEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectoryEntry {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

impl DirectoryEntry {
    fn into_row(self) -> AuthorRow {
        let external_id = match self.id {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        let author_name = [self.first_name, self.last_name]
            .into_iter()
            .flatten()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        AuthorRow {
            external_id,
            author_name,
            author_link: None,
        }
    }
}

impl DirectorySheet {
    /// Create a directory source
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: DirectoryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<DirectoryEntry>> {
        let request = PageRequest {
            user_id: self.config.user_id,
            device: self.config.device,
            page,
            limit: self.config.page_size,
        };

        let response = self
            .http_client
            .post(&self.config.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Other(format!(
                "author directory returned HTTP {} for page {}",
                status.as_u16(),
                page
            )));
        }

        let body: PageResponse = response.json().await?;
        Ok(body.authors)
    }
}

#[async_trait]
impl SpreadsheetSource for DirectorySheet {
    async fn fetch_authors(&self) -> Result<Vec<AuthorRow>> {
        let mut rows = Vec::new();

        for page in 1..=self.config.max_pages {
            let entries = self.fetch_page(page).await?;
            if entries.is_empty() {
                debug!(page, "author directory exhausted");
                break;
            }
            debug!(page, count = entries.len(), "fetched author directory page");
            rows.extend(entries.into_iter().map(DirectoryEntry::into_row));
        }

        info!(rows = rows.len(), "fetched author directory");
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
