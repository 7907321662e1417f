//! Hand-written collaborators for pipeline tests

use crate::catalog::CatalogSource;
use crate::db::Database;
use crate::error::DatabaseError;
use crate::pipeline::{Collaborators, SyncPipeline};
use crate::publish::{Publisher, PublisherFactory};
use crate::sheet::SpreadsheetSource;
use crate::store::{CredentialPool, RecordStore, StaticCredentials};
use crate::types::{
    Author, AuthorId, AuthorRow, Book, BookId, Credential, ListingRef, NewAuthor, NewBook,
    PostReceipt, ScrapeState, UpsertOutcome,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Sheet returning fixed rows, or failing when `rows` is `None`
pub struct FixedSheet {
    pub rows: Option<Vec<AuthorRow>>,
}

#[async_trait]
impl SpreadsheetSource for FixedSheet {
    async fn fetch_authors(&self) -> Result<Vec<AuthorRow>> {
        self.rows
            .clone()
            .ok_or_else(|| Error::Other("sheet unreachable".to_string()))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Catalog answering from in-memory tables
#[derive(Default)]
pub struct FakeCatalog {
    /// author link → listing
    pub listings: HashMap<String, Vec<ListingRef>>,
    /// book link → titles of the books the detail expands to
    pub details: HashMap<String, Vec<String>>,
    /// author or book links that fail
    pub failing: HashSet<String>,
    /// every link requested, in order
    pub requests: Mutex<Vec<String>>,
}

impl FakeCatalog {
    /// Add an author with an empty listing
    pub fn with_author(mut self, author_link: &str) -> Self {
        self.listings.entry(author_link.to_string()).or_default();
        self
    }

    /// Append a listing entry whose detail expands to one book per title
    pub fn with_book(mut self, author_link: &str, book_link: &str, titles: &[&str]) -> Self {
        self.listings
            .entry(author_link.to_string())
            .or_default()
            .push(ListingRef {
                title: titles.first().copied().unwrap_or("untitled").to_string(),
                author_name: None,
                link: book_link.to_string(),
            });
        self.details.insert(
            book_link.to_string(),
            titles.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Make a link fail
    pub fn failing(mut self, link: &str) -> Self {
        self.failing.insert(link.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, link: &str) -> Result<()> {
        self.requests.lock().unwrap().push(link.to_string());
        if self.failing.contains(link) {
            return Err(Error::catalog(link, "catalog unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_books(&self, author_link: &str) -> Result<Vec<ListingRef>> {
        self.record(author_link)?;
        Ok(self.listings.get(author_link).cloned().unwrap_or_default())
    }

    async fn book_details(&self, listing: &ListingRef, author: &Author) -> Result<Vec<NewBook>> {
        self.record(&listing.link)?;
        let titles = self.details.get(&listing.link).cloned().unwrap_or_default();
        Ok(titles
            .into_iter()
            .map(|title| NewBook {
                author_id: author.id,
                title,
                author_name: Some(author.name.clone()),
                remote_author_id: author.external_id.clone(),
                category: None,
                category_id: Some(20),
                book_link: listing.link.clone(),
                content: "<p>content</p>".to_string(),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// One post seen by the fake sink
#[derive(Clone, Debug, PartialEq)]
pub struct PostCall {
    pub book_id: BookId,
    pub title: String,
    pub token: String,
}

/// Publisher factory whose publishers reject configured titles
#[derive(Default)]
pub struct FakePublisherFactory {
    pub rejected_titles: HashSet<String>,
    pub calls: Arc<Mutex<Vec<PostCall>>>,
    pub clients_built: Mutex<usize>,
}

impl FakePublisherFactory {
    pub fn rejecting(titles: &[&str]) -> Self {
        Self {
            rejected_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<PostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clients_built(&self) -> usize {
        *self.clients_built.lock().unwrap()
    }
}

impl PublisherFactory for FakePublisherFactory {
    fn client(&self, credential: &Credential) -> Result<Box<dyn Publisher>> {
        *self.clients_built.lock().unwrap() += 1;
        Ok(Box::new(FakePublisher {
            token: credential.token().to_string(),
            rejected_titles: self.rejected_titles.clone(),
            calls: self.calls.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakePublisher {
    token: String,
    rejected_titles: HashSet<String>,
    calls: Arc<Mutex<Vec<PostCall>>>,
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn post(&self, book: &Book) -> Result<PostReceipt> {
        self.calls.lock().unwrap().push(PostCall {
            book_id: book.id,
            title: book.title.clone(),
            token: self.token.clone(),
        });
        if self.rejected_titles.contains(&book.title) {
            return Err(Error::Rejected {
                status: Some(422),
                message: format!("{} rejected", book.title),
            });
        }
        Ok(PostReceipt {
            remote_id: format!("remote-{}", book.id),
        })
    }
}

/// Store whose every operation fails
pub struct BrokenStore;

fn broken<T>() -> Result<T> {
    Err(Error::Database(DatabaseError::QueryFailed(
        "store offline".to_string(),
    )))
}

#[async_trait]
impl RecordStore for BrokenStore {
    async fn upsert_author(&self, _author: &NewAuthor) -> Result<(Author, UpsertOutcome)> {
        broken()
    }

    async fn query_authors(&self, _state: ScrapeState) -> Result<Vec<Author>> {
        broken()
    }

    async fn set_author_scraped(&self, _id: AuthorId, _state: ScrapeState) -> Result<()> {
        broken()
    }

    async fn create_book(&self, _book: &NewBook) -> Result<Book> {
        broken()
    }

    async fn query_books(&self, _is_posted: bool) -> Result<Vec<Book>> {
        broken()
    }

    async fn mark_book_posted(&self, _id: BookId, _receipt: &PostReceipt) -> Result<()> {
        broken()
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

/// SQLite store that fails to record postings or to create one title
pub struct FlakyStore {
    pub inner: Arc<Database>,
    pub fail_marking: bool,
    pub fail_title: Option<String>,
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn upsert_author(&self, author: &NewAuthor) -> Result<(Author, UpsertOutcome)> {
        RecordStore::upsert_author(self.inner.as_ref(), author).await
    }

    async fn query_authors(&self, state: ScrapeState) -> Result<Vec<Author>> {
        self.inner.query_authors(state).await
    }

    async fn set_author_scraped(&self, id: AuthorId, state: ScrapeState) -> Result<()> {
        RecordStore::set_author_scraped(self.inner.as_ref(), id, state).await
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        if self.fail_title.as_deref() == Some(book.title.as_str()) {
            return broken();
        }
        self.inner.create_book(book).await
    }

    async fn query_books(&self, is_posted: bool) -> Result<Vec<Book>> {
        self.inner.query_books(is_posted).await
    }

    async fn mark_book_posted(&self, id: BookId, receipt: &PostReceipt) -> Result<()> {
        if self.fail_marking {
            return broken();
        }
        RecordStore::mark_book_posted(self.inner.as_ref(), id, receipt).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// SQLite store whose flag queries return every record
pub struct UnfilteredStore {
    pub inner: Arc<Database>,
}

#[async_trait]
impl RecordStore for UnfilteredStore {
    async fn upsert_author(&self, author: &NewAuthor) -> Result<(Author, UpsertOutcome)> {
        RecordStore::upsert_author(self.inner.as_ref(), author).await
    }

    async fn query_authors(&self, _state: ScrapeState) -> Result<Vec<Author>> {
        self.inner.list_authors().await
    }

    async fn set_author_scraped(&self, id: AuthorId, state: ScrapeState) -> Result<()> {
        RecordStore::set_author_scraped(self.inner.as_ref(), id, state).await
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        self.inner.create_book(book).await
    }

    async fn query_books(&self, _is_posted: bool) -> Result<Vec<Book>> {
        let mut books = self.inner.list_books_by_posted(true).await?;
        books.extend(self.inner.list_books_by_posted(false).await?);
        Ok(books)
    }

    async fn mark_book_posted(&self, id: BookId, receipt: &PostReceipt) -> Result<()> {
        RecordStore::mark_book_posted(self.inner.as_ref(), id, receipt).await
    }

    fn name(&self) -> &'static str {
        "unfiltered"
    }
}

/// Credential pool that counts fetches and can be swapped between sweeps
#[derive(Default)]
pub struct RotatingPool {
    pub tokens: Mutex<Vec<String>>,
    pub fetches: Mutex<usize>,
}

impl RotatingPool {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
            ..Default::default()
        }
    }

    /// Replace the pool contents
    pub fn rotate(&self, tokens: &[&str]) {
        *self.tokens.lock().unwrap() = tokens.iter().map(|t| t.to_string()).collect();
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl CredentialPool for RotatingPool {
    async fn fetch_all(&self) -> Result<Vec<Credential>> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Credential::new)
            .collect())
    }

    fn name(&self) -> &'static str {
        "rotating"
    }
}

/// Pipeline over a temporary SQLite store and test doubles
pub struct Harness {
    pub pipeline: SyncPipeline,
    pub db: Arc<Database>,
    pub catalog: Arc<FakeCatalog>,
    pub publisher: Arc<FakePublisherFactory>,
    _temp_file: NamedTempFile,
}

impl Harness {
    pub async fn new(
        rows: Option<Vec<AuthorRow>>,
        catalog: FakeCatalog,
        tokens: &[&str],
        publisher: FakePublisherFactory,
    ) -> Self {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
        Self::with_store(temp_file, db.clone(), db, rows, catalog, tokens, publisher)
    }

    pub fn with_store(
        temp_file: NamedTempFile,
        db: Arc<Database>,
        store: Arc<dyn RecordStore>,
        rows: Option<Vec<AuthorRow>>,
        catalog: FakeCatalog,
        tokens: &[&str],
        publisher: FakePublisherFactory,
    ) -> Self {
        let credentials: Arc<dyn CredentialPool> =
            Arc::new(StaticCredentials::new(tokens.iter().copied()));
        Self::assemble(temp_file, db, store, rows, catalog, credentials, publisher)
    }

    /// Pipeline over a fresh store drawing credentials from `pool`
    pub async fn with_pool(pool: Arc<dyn CredentialPool>, publisher: FakePublisherFactory) -> Self {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
        Self::assemble(
            temp_file,
            db.clone(),
            db,
            None,
            FakeCatalog::default(),
            pool,
            publisher,
        )
    }

    fn assemble(
        temp_file: NamedTempFile,
        db: Arc<Database>,
        store: Arc<dyn RecordStore>,
        rows: Option<Vec<AuthorRow>>,
        catalog: FakeCatalog,
        credentials: Arc<dyn CredentialPool>,
        publisher: FakePublisherFactory,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let publisher = Arc::new(publisher);

        let pipeline = SyncPipeline::new(Collaborators {
            sheet: Arc::new(FixedSheet { rows }),
            store,
            catalog: catalog.clone(),
            credentials,
            publisher: publisher.clone(),
        });

        Self {
            pipeline,
            db,
            catalog,
            publisher,
            _temp_file: temp_file,
        }
    }

    /// Insert a linked author straight into the store
    pub async fn author(&self, link: &str, name: &str) -> Author {
        self.db
            .upsert_author(&NewAuthor {
                external_id: Some("248".to_string()),
                name: name.to_string(),
                link: Some(link.to_string()),
            })
            .await
            .unwrap()
            .0
    }

    /// Insert an unposted book straight into the store
    pub async fn book(&self, author_id: AuthorId, title: &str) -> Book {
        self.db
            .insert_book(&NewBook {
                author_id,
                title: title.to_string(),
                author_name: None,
                remote_author_id: Some("248".to_string()),
                category: None,
                category_id: Some(20),
                book_link: format!("https://catalog.test/{title}"),
                content: "<p>content</p>".to_string(),
            })
            .await
            .unwrap()
    }
}
