//! Multipart publisher for the platform's book creation endpoint

use super::{Publisher, PublisherFactory};
use crate::config::PublishConfig;
use crate::types::{Book, Credential, PostReceipt};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, ORIGIN, REFERER};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

/// Factory for [`HttpPublisher`]s
#[derive(Clone, Debug)]
pub struct HttpPublisherFactory {
    config: PublishConfig,
}

impl HttpPublisherFactory {
    /// Factory posting to the configured endpoint
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }
}

impl PublisherFactory for HttpPublisherFactory {
    fn client(&self, credential: &Credential) -> Result<Box<dyn Publisher>> {
        Ok(Box::new(HttpPublisher::new(&self.config, credential.clone())?))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Publisher bound to a single credential
///
/// Sends the book as a multipart form with one `data` part holding the JSON
/// payload, authorized with the credential as bearer token. A post counts as
/// accepted only when the sink answers with a success status and a
/// `last_book.id`; any other answer is a rejection carrying the sink's
/// `message`.
pub struct HttpPublisher {
    http_client: reqwest::Client,
    endpoint: String,
    origin: Option<String>,
    incomplete_series_label: String,
    credential: Credential,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookPayload<'a> {
    pub title: &'a str,
    pub category: IdRef,
    pub author: IdRef,
    pub content: &'a str,
    pub tags: Vec<String>,
    pub series_name: &'a str,
}

#[derive(Serialize)]
pub(crate) struct IdRef {
    pub id: serde_json::Value,
}

#[derive(Deserialize)]
struct PostResponse {
    #[serde(default)]
    last_book: Option<LastBook>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct LastBook {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

impl HttpPublisher {
    /// Create a publisher for one credential
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &PublishConfig, credential: Credential) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            origin: config.origin.clone(),
            incomplete_series_label: config.incomplete_series_label.clone(),
            credential,
        })
    }

    /// JSON document sent in the `data` part
    pub(crate) fn payload<'a>(&'a self, book: &'a Book) -> Result<BookPayload<'a>> {
        let Some(author_id) = book
            .remote_author_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            return Err(Error::Rejected {
                status: None,
                message: format!("book {} has no publisher author id", book.id),
            });
        };

        let series_name = match book.category.as_deref() {
            Some(category) if category.trim() == self.incomplete_series_label => {
                self.incomplete_series_label.as_str()
            }
            _ => "",
        };

        Ok(BookPayload {
            title: &book.title,
            category: IdRef {
                id: book.category_id.map(Into::into).unwrap_or(serde_json::Value::Null),
            },
            author: IdRef {
                id: numeric_or_string(author_id),
            },
            content: &book.content,
            tags: Vec::new(),
            series_name,
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn post(&self, book: &Book) -> Result<PostReceipt> {
        let data = serde_json::to_string(&self.payload(book)?)?;
        let form = Form::new().part("data", Part::text(data).mime_str("application/json")?);

        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.credential.token()))
            .multipart(form);
        if let Some(origin) = &self.origin {
            let origin = origin.trim_end_matches('/');
            request = request
                .header(ORIGIN, origin)
                .header(REFERER, format!("{}/", origin));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<PostResponse> = serde_json::from_str(&body).ok();

        let remote_id = parsed
            .as_ref()
            .and_then(|r| r.last_book.as_ref())
            .and_then(|b| b.id.as_ref())
            .and_then(|id| match id {
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                _ => None,
            });

        match remote_id {
            Some(remote_id) if status.is_success() => {
                tracing::debug!(
                    book_id = %book.id,
                    remote_id = %remote_id,
                    credential = %self.credential,
                    "book accepted"
                );
                Ok(PostReceipt { remote_id })
            }
            _ => {
                let message = parsed
                    .and_then(|r| r.message)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| format!("HTTP {} without book id", status.as_u16()));
                Err(Error::Rejected {
                    status: Some(status.as_u16()),
                    message,
                })
            }
        }
    }
}

fn numeric_or_string(id: &str) -> serde_json::Value {
    match id.parse::<i64>() {
        Ok(n) => n.into(),
        Err(_) => id.into(),
    }
}
