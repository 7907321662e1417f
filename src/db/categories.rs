//! Category table used to resolve catalog labels to publisher category ids.

use crate::Result;
use crate::config::CategoryLabel;
use sqlx::SqliteConnection;

use super::{Database, query_failed};

impl Database {
    /// Insert or rename a category
    ///
    /// A label already held by another id moves to `id`.
    pub async fn upsert_category(&self, id: i64, label: &str) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_failed("Failed to begin category upsert", e))?;

        write_category(&mut *tx, id, label).await?;

        tx.commit()
            .await
            .map_err(|e| query_failed("Failed to commit category upsert", e))
    }

    /// Replace the whole table with `entries`
    ///
    /// Runs in one transaction; on failure the previous table is kept. Later
    /// entries win when ids or labels repeat.
    pub async fn replace_categories(&self, entries: &[CategoryLabel]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_failed("Failed to begin category replace", e))?;

        sqlx::query("DELETE FROM categories")
            .execute(&mut *tx)
            .await
            .map_err(|e| query_failed("Failed to clear categories", e))?;

        for entry in entries {
            write_category(&mut *tx, entry.id, &entry.label).await?;
        }

        tx.commit()
            .await
            .map_err(|e| query_failed("Failed to commit category replace", e))
    }

    /// List the category table
    pub async fn list_categories(&self) -> Result<Vec<CategoryLabel>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, label FROM categories ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| query_failed("Failed to list categories", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, label)| CategoryLabel { id, label })
            .collect())
    }
}

async fn write_category(conn: &mut SqliteConnection, id: i64, label: &str) -> Result<()> {
    let label = label.trim();

    // label is unique
    sqlx::query("DELETE FROM categories WHERE label = ? AND id != ?")
        .bind(label)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| query_failed("Failed to release category label", e))?;

    sqlx::query(
        r#"
        INSERT INTO categories (id, label) VALUES (?, ?)
        ON CONFLICT(id) DO UPDATE SET label = excluded.label
        "#,
    )
    .bind(id)
    .bind(label)
    .execute(&mut *conn)
    .await
    .map_err(|e| query_failed("Failed to upsert category", e))?;

    Ok(())
}
