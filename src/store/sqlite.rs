//! [`Database`] as record store and verified-credential pool

use super::traits::{CredentialPool, RecordStore};
use crate::Result;
use crate::db::Database;
use crate::types::{
    Author, AuthorId, Book, BookId, Credential, NewAuthor, NewBook, PostReceipt, ScrapeState,
    UpsertOutcome,
};
use async_trait::async_trait;

#[async_trait]
impl RecordStore for Database {
    async fn upsert_author(&self, author: &NewAuthor) -> Result<(Author, UpsertOutcome)> {
        Database::upsert_author(self, author).await
    }

    async fn query_authors(&self, state: ScrapeState) -> Result<Vec<Author>> {
        self.list_authors_by_scraped(state).await
    }

    async fn set_author_scraped(&self, id: AuthorId, state: ScrapeState) -> Result<()> {
        Database::set_author_scraped(self, id, state).await
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        self.insert_book(book).await
    }

    async fn query_books(&self, is_posted: bool) -> Result<Vec<Book>> {
        self.list_books_by_posted(is_posted).await
    }

    async fn mark_book_posted(&self, id: BookId, receipt: &PostReceipt) -> Result<()> {
        Database::mark_book_posted(self, id, &receipt.remote_id).await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[async_trait]
impl CredentialPool for Database {
    async fn fetch_all(&self) -> Result<Vec<Credential>> {
        self.list_verified_credentials().await
    }

    fn name(&self) -> &'static str {
        "sqlite-verified"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_store_through_trait_object() {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
        let store: Arc<dyn RecordStore> = db.clone();

        let (author, _) = store
            .upsert_author(&NewAuthor {
                external_id: None,
                name: "Jane Doe".to_string(),
                link: Some("a1".to_string()),
            })
            .await
            .unwrap();
        let book = store
            .create_book(&NewBook {
                author_id: author.id,
                title: "Debi".to_string(),
                author_name: None,
                remote_author_id: None,
                category: None,
                category_id: Some(20),
                book_link: "b1".to_string(),
                content: "<p>x</p>".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(store.query_books(false).await.unwrap().len(), 1);
        store
            .mark_book_posted(
                book.id,
                &PostReceipt {
                    remote_id: "77".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(store.query_books(false).await.unwrap().is_empty());
        assert_eq!(db.book_remote_id(book.id).await.unwrap().as_deref(), Some("77"));
    }

    #[tokio::test]
    async fn test_pool_holds_verified_tokens_only() {
        let temp_file = NamedTempFile::new().unwrap();
        let db = Database::new(temp_file.path()).await.unwrap();
        db.upsert_credential(None, "good", true).await.unwrap();
        db.upsert_credential(None, "pending", false).await.unwrap();

        let pool: &dyn CredentialPool = &db;
        let tokens = pool.fetch_all().await.unwrap();
        assert_eq!(tokens, vec![Credential::new("good")]);
    }
}
