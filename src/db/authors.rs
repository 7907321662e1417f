//! Author upsert and scraped-flag operations.

use crate::error::DatabaseError;
use crate::types::{Author, AuthorId, NewAuthor, ScrapeState, UpsertOutcome};
use crate::{Error, Result};

use super::{AuthorRecord, Database, query_failed};

const AUTHOR_COLUMNS: &str =
    "id, external_id, author_name, author_link, is_scraped, created_at, updated_at";

impl Database {
    /// Insert an author, or refresh the one already stored under the same key
    ///
    /// The key is the catalog link. When no author has that link, or the row has
    /// none, the external id is matched among link-less authors, and a matched
    /// author takes over the row's link. An existing author keeps its scraped
    /// flag; only the name, a newly known external id and a first link are
    /// written.
    pub async fn upsert_author(&self, author: &NewAuthor) -> Result<(Author, UpsertOutcome)> {
        let name = author.name.trim();
        if name.is_empty() {
            return Err(Error::Database(DatabaseError::ConstraintViolation(
                "author name must not be blank".to_string(),
            )));
        }
        let link = author
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());
        let external_id = author
            .external_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        if link.is_none() && external_id.is_none() {
            return Err(Error::Database(DatabaseError::ConstraintViolation(
                "author needs a link or an external id".to_string(),
            )));
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_failed("Failed to begin author upsert", e))?;

        let mut existing = match link {
            Some(link) => sqlx::query_as::<_, AuthorRecord>(&format!(
                "SELECT {AUTHOR_COLUMNS} FROM authors WHERE author_link = ?"
            ))
            .bind(link)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| query_failed("Failed to look up author by link", e))?,
            None => None,
        };
        // an author first seen without a link is adopted by its external id
        let mut adopt_link = None;
        if existing.is_none()
            && let Some(external_id) = external_id
        {
            existing = sqlx::query_as::<_, AuthorRecord>(&format!(
                "SELECT {AUTHOR_COLUMNS} FROM authors
                 WHERE author_link IS NULL AND external_id = ?
                 ORDER BY id LIMIT 1"
            ))
            .bind(external_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| query_failed("Failed to look up author by external id", e))?;
            if existing.is_some() {
                adopt_link = link;
            }
        }

        let (id, outcome) = match existing {
            Some(row) => {
                let name_changed = row.author_name != name;
                let external_changed =
                    external_id.is_some() && row.external_id.as_deref() != external_id;

                if name_changed || external_changed || adopt_link.is_some() {
                    sqlx::query(
                        r#"
                        UPDATE authors
                        SET author_name = ?,
                            external_id = COALESCE(?, external_id),
                            author_link = COALESCE(?, author_link),
                            updated_at = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(name)
                    .bind(external_id)
                    .bind(adopt_link)
                    .bind(now)
                    .bind(row.id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| query_failed("Failed to update author", e))?;
                    (row.id, UpsertOutcome::Updated)
                } else {
                    (row.id, UpsertOutcome::Unchanged)
                }
            }
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO authors (
                        external_id, author_name, author_link, is_scraped, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(external_id)
                .bind(name)
                .bind(link)
                .bind(ScrapeState::No.as_str())
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(|e| query_failed("Failed to insert author", e))?;
                (result.last_insert_rowid(), UpsertOutcome::Created)
            }
        };

        tx.commit()
            .await
            .map_err(|e| query_failed("Failed to commit author upsert", e))?;

        let stored = self.get_author(AuthorId(id)).await?.ok_or_else(|| {
            Error::Database(DatabaseError::NotFound(format!("author {}", id)))
        })?;

        Ok((stored, outcome))
    }

    /// Get an author by ID
    pub async fn get_author(&self, id: AuthorId) -> Result<Option<Author>> {
        let row = sqlx::query_as::<_, AuthorRecord>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to get author", e))?;

        Ok(row.map(Author::from))
    }

    /// List all authors in insertion order
    pub async fn list_authors(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query_as::<_, AuthorRecord>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list authors", e))?;

        Ok(rows.into_iter().map(Author::from).collect())
    }

    /// List authors by scraped flag
    ///
    /// [`ScrapeState::No`] also selects authors whose flag was never set.
    pub async fn list_authors_by_scraped(&self, state: ScrapeState) -> Result<Vec<Author>> {
        let filter = match state {
            ScrapeState::No => "is_scraped IS NULL OR is_scraped = 'no'",
            ScrapeState::Yes => "is_scraped = 'yes'",
        };
        let rows = sqlx::query_as::<_, AuthorRecord>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE {filter} ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_failed("Failed to list authors by scraped flag", e))?;

        Ok(rows.into_iter().map(Author::from).collect())
    }

    /// Set an author's scraped flag
    pub async fn set_author_scraped(&self, id: AuthorId, state: ScrapeState) -> Result<()> {
        let result = sqlx::query("UPDATE authors SET is_scraped = ?, updated_at = ? WHERE id = ?")
            .bind(state.as_str())
            .bind(chrono::Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to set scraped flag", e))?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "author {}",
                id
            ))));
        }

        Ok(())
    }

    /// Count stored authors
    pub async fn count_authors(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_failed("Failed to count authors", e))
    }
}
