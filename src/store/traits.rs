//! Traits for the canonical record store and the credential pool

use crate::Result;
use crate::types::{
    Author, AuthorId, Book, BookId, Credential, NewAuthor, NewBook, PostReceipt, ScrapeState,
    UpsertOutcome,
};
use async_trait::async_trait;

/// Canonical store of authors and books
///
/// Implementations validate records at this boundary: a blank name, a blank
/// title, or an author with neither link nor external id is refused with
/// [`DatabaseError::ConstraintViolation`](crate::error::DatabaseError::ConstraintViolation).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the author if no author has the same key, otherwise refresh it
    ///
    /// An existing author keeps its scraped flag.
    async fn upsert_author(&self, author: &NewAuthor) -> Result<(Author, UpsertOutcome)>;

    /// Authors with the given scraped flag
    ///
    /// Querying [`ScrapeState::No`] also returns authors whose flag is absent.
    async fn query_authors(&self, state: ScrapeState) -> Result<Vec<Author>>;

    /// Set an author's scraped flag
    async fn set_author_scraped(&self, id: AuthorId, state: ScrapeState) -> Result<()>;

    /// Store one harvested book
    async fn create_book(&self, book: &NewBook) -> Result<Book>;

    /// Books with the given posted flag
    async fn query_books(&self, is_posted: bool) -> Result<Vec<Book>>;

    /// Record that the publishing sink accepted a book
    ///
    /// Never moves the flag back to false.
    async fn mark_book_posted(&self, id: BookId, receipt: &PostReceipt) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Source of interchangeable publishing credentials
#[async_trait]
pub trait CredentialPool: Send + Sync {
    /// Snapshot of every usable credential
    async fn fetch_all(&self) -> Result<Vec<Credential>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
