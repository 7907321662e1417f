//! Database layer for bookshelf-sync
//!
//! SQLite persistence for the record store: authors, books, the credential pool and
//! the category table.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`authors`] - Author upsert, flag queries and the scraped flag
//! - [`books`] - Book creation, flag queries and the posted flag
//! - [`credentials`] - Publishing tokens and their verification state
//! - [`categories`] - Category id table used by the catalog

use crate::error::{DatabaseError, Error};
use crate::types::{Author, AuthorId, Book, BookId, ScrapeState};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{FromRow, sqlite::SqlitePool};

mod authors;
mod books;
mod categories;
mod credentials;
mod migrations;

/// Author record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct AuthorRecord {
    /// Unique database ID
    pub id: i64,
    /// Publishing-platform id
    pub external_id: Option<String>,
    /// Display name
    pub author_name: String,
    /// Catalog link
    pub author_link: Option<String>,
    /// 'no', 'yes' or NULL
    pub is_scraped: Option<String>,
    /// Unix timestamp when the author was inserted
    pub created_at: i64,
    /// Unix timestamp of the last change
    pub updated_at: i64,
}

impl From<AuthorRecord> for Author {
    fn from(row: AuthorRecord) -> Self {
        Author {
            id: AuthorId(row.id),
            external_id: row.external_id,
            name: row.author_name,
            link: row.author_link,
            is_scraped: row.is_scraped.as_deref().and_then(ScrapeState::parse),
            created_at: timestamp(row.created_at),
        }
    }
}

/// Book record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct BookRecord {
    /// Unique database ID
    pub id: i64,
    /// Owning author
    pub author_id: i64,
    /// Title
    pub title: String,
    /// Author name as shown by the catalog
    pub author_name: Option<String>,
    /// Publishing-platform author id
    pub remote_author_id: Option<String>,
    /// Comma-joined category labels
    pub category: Option<String>,
    /// Publishing-platform category id
    pub category_id: Option<i64>,
    /// Catalog page
    pub book_link: String,
    /// HTML body
    pub content: String,
    /// Whether the sink accepted the book
    pub is_posted: bool,
    /// Id assigned by the sink
    pub remote_id: Option<String>,
    /// Unix timestamp when the sink accepted the book
    pub posted_at: Option<i64>,
    /// Unix timestamp when the book was inserted
    pub created_at: i64,
}

impl From<BookRecord> for Book {
    fn from(row: BookRecord) -> Self {
        Book {
            id: BookId(row.id),
            author_id: AuthorId(row.author_id),
            title: row.title,
            author_name: row.author_name,
            remote_author_id: row.remote_author_id,
            category: row.category,
            category_id: row.category_id,
            book_link: row.book_link,
            content: row.content,
            is_posted: row.is_posted,
            created_at: timestamp(row.created_at),
        }
    }
}

/// Credential record from database
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRecord {
    /// Unique database ID
    pub id: i64,
    /// Who the token belongs to (free text)
    pub label: Option<String>,
    /// Raw token
    pub token: String,
    /// Only verified tokens join the pool
    pub is_verified: bool,
    /// Unix timestamp when the token was added
    pub created_at: i64,
}

/// Database handle for bookshelf-sync
pub struct Database {
    pool: SqlitePool,
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now)
}

/// Map a query failure, keeping constraint violations distinguishable
fn query_failed(context: &str, e: sqlx::Error) -> Error {
    if let Some(db_err) = e.as_database_error()
        && (db_err.is_unique_violation()
            || db_err.is_foreign_key_violation()
            || db_err.is_check_violation())
    {
        return Error::Database(DatabaseError::ConstraintViolation(format!(
            "{}: {}",
            context, db_err
        )));
    }
    Error::Database(DatabaseError::QueryFailed(format!("{}: {}", context, e)))
}
