//! Catalog client over the catalog's JSON endpoints

use super::normalize::{heading_title, split_listing_title, strip_numeral_prefix};
use super::{CatalogSource, CategoryResolver};
use crate::config::CatalogConfig;
use crate::types::{Author, ListingRef, NewBook};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Separator placed between page contents of an aggregated book
const PAGE_SEPARATOR: &str = "<br/>";

/// HTTP catalog client
///
/// An author link answers with `{"books": [{"title", "link"}]}`; a book link
/// answers with `{"title", "categories", "pages": [{"title", "url", "content"}]}`.
/// Relative book links are resolved against the author link.
pub struct HttpCatalog {
    http_client: reqwest::Client,
    multi_page: bool,
    resolver: CategoryResolver,
}

#[derive(Deserialize)]
struct ListingResponse {
    #[serde(default)]
    books: Vec<ListingEntry>,
}

#[derive(Deserialize)]
struct ListingEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: Option<String>,
}

/// Detail record of one catalog book
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct BookDetail {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub pages: Vec<DetailPage>,
}

/// One content page of a catalog book
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct DetailPage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl HttpCatalog {
    /// Create a catalog client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &CatalogConfig, resolver: CategoryResolver) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            multi_page: config.multi_page,
            resolver,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, link: &str) -> Result<T> {
        let url = url::Url::parse(link.trim())
            .map_err(|e| Error::catalog(link, format!("invalid link: {}", e)))?;

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::catalog(
                link,
                format!("catalog returned HTTP {}", status.as_u16()),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::catalog(link, format!("malformed response: {}", e)))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn list_books(&self, author_link: &str) -> Result<Vec<ListingRef>> {
        let base = url::Url::parse(author_link.trim())
            .map_err(|e| Error::catalog(author_link, format!("invalid link: {}", e)))?;
        let listing: ListingResponse = self.get_json(author_link).await?;

        let mut refs = Vec::with_capacity(listing.books.len());
        for entry in listing.books {
            let Some(link) = entry.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
            else {
                warn!(author_link, title = %entry.title, "listing entry without link skipped");
                continue;
            };
            let link = base
                .join(link)
                .map_err(|e| Error::catalog(author_link, format!("bad book link {link:?}: {e}")))?;
            let (title, author_name) = split_listing_title(&entry.title);
            refs.push(ListingRef {
                title,
                author_name,
                link: link.to_string(),
            });
        }

        debug!(author_link, books = refs.len(), "listed author books");
        Ok(refs)
    }

    async fn book_details(&self, listing: &ListingRef, author: &Author) -> Result<Vec<NewBook>> {
        let detail: BookDetail = self.get_json(&listing.link).await?;
        let books = expand_detail(detail, listing, author, self.multi_page, &self.resolver);
        debug!(link = %listing.link, books = books.len(), "expanded book details");
        Ok(books)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Turn a detail record into the books it yields
///
/// Aggregated mode joins the non-empty page contents into one book; multi-page
/// mode yields one book per non-empty page. No content means no book.
pub(crate) fn expand_detail(
    detail: BookDetail,
    listing: &ListingRef,
    author: &Author,
    multi_page: bool,
    resolver: &CategoryResolver,
) -> Vec<NewBook> {
    let mut title = strip_numeral_prefix(&heading_title(&detail.title));
    if title.is_empty() {
        title = strip_numeral_prefix(&listing.title);
    }

    let labels: Vec<String> = detail
        .categories
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    let category = (!labels.is_empty()).then(|| labels.join(", "));
    let category_id = resolver.resolve(&labels);

    let template = NewBook {
        author_id: author.id,
        title,
        author_name: listing
            .author_name
            .clone()
            .or_else(|| Some(author.name.clone())),
        remote_author_id: author.external_id.clone(),
        category,
        category_id: Some(category_id),
        book_link: listing.link.clone(),
        content: String::new(),
    };

    let pages = detail
        .pages
        .into_iter()
        .filter(|page| !page.content.trim().is_empty());

    if multi_page {
        return pages
            .map(|page| {
                let page_title = strip_numeral_prefix(&page.title);
                NewBook {
                    title: if page_title.is_empty() {
                        template.title.clone()
                    } else {
                        page_title
                    },
                    book_link: page.url.unwrap_or_else(|| listing.link.clone()),
                    content: page.content,
                    ..template.clone()
                }
            })
            .filter(|book| !book.title.is_empty())
            .collect();
    }

    let content = pages
        .map(|page| page.content)
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR);
    if content.is_empty() || template.title.is_empty() {
        return Vec::new();
    }

    vec![NewBook {
        content,
        ..template
    }]
}
