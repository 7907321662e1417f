//! Book creation and posted-flag operations.

use crate::error::DatabaseError;
use crate::types::{AuthorId, Book, BookId, NewBook};
use crate::{Error, Result};

use super::{BookRecord, Database, query_failed};

const BOOK_COLUMNS: &str = "id, author_id, title, author_name, remote_author_id, category, \
     category_id, book_link, content, is_posted, remote_id, posted_at, created_at";

impl Database {
    /// Insert a harvested book
    ///
    /// No uniqueness is enforced on title or link: submitting the same detail
    /// record twice stores it twice.
    pub async fn insert_book(&self, book: &NewBook) -> Result<Book> {
        if book.title.trim().is_empty() {
            return Err(Error::Database(DatabaseError::ConstraintViolation(
                "book title must not be blank".to_string(),
            )));
        }

        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO books (
                author_id, title, author_name, remote_author_id, category,
                category_id, book_link, content, is_posted, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(book.author_id)
        .bind(book.title.trim())
        .bind(&book.author_name)
        .bind(&book.remote_author_id)
        .bind(&book.category)
        .bind(book.category_id)
        .bind(&book.book_link)
        .bind(&book.content)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to insert book", e))?;

        let id = BookId(result.last_insert_rowid());
        self.get_book(id)
            .await?
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("book {}", id))))
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to get book", e))?;

        Ok(row.map(Book::from))
    }

    /// List books by posted flag, oldest first
    pub async fn list_books_by_posted(&self, is_posted: bool) -> Result<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE is_posted = ? ORDER BY id ASC"
        ))
        .bind(is_posted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list books by posted flag", e))?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    /// List the books owned by one author
    pub async fn list_books_for_author(&self, author_id: AuthorId) -> Result<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE author_id = ? ORDER BY id ASC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list books for author", e))?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    /// Mark a book as accepted by the publishing sink
    ///
    /// Only ever moves the flag from false to true; marking an already-posted
    /// book again is a no-op that keeps the first remote id.
    pub async fn mark_book_posted(&self, id: BookId, remote_id: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET is_posted = 1, remote_id = ?, posted_at = ?
            WHERE id = ? AND is_posted = 0
            "#,
        )
        .bind(remote_id)
        .bind(chrono::Utc::now().timestamp())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to mark book posted", e))?;

        if result.rows_affected() == 0 && self.get_book(id).await?.is_none() {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "book {}",
                id
            ))));
        }

        Ok(())
    }

    /// Remote id recorded when the book was accepted
    pub async fn book_remote_id(&self, id: BookId) -> Result<Option<String>> {
        let remote_id: Option<Option<String>> =
            sqlx::query_scalar("SELECT remote_id FROM books WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| query_failed("Failed to get remote id", e))?;

        Ok(remote_id.flatten())
    }

    /// Count stored books
    pub async fn count_books(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to count books", e))
    }
}
