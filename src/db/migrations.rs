//! Database lifecycle and schema migrations.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

use super::Database;

impl Database {
    /// Create a new database connection
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    pub async fn new(path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory: {}",
                    e
                )))
            })?;
        }

        // Connect to database with foreign key enforcement and WAL mode
        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options).await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to connect to database: {}",
                e
            )))
        })?;

        let db = Self { pool };

        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create schema_version table: {}",
                e
            )))
        })?;

        let current_version: Option<i64> =
            sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to query schema version: {}",
                        e
                    )))
                })?
                .flatten();

        let current_version = current_version.unwrap_or(0);

        if current_version < 1 {
            Self::migrate(&mut conn, 1).await?;
        }
        if current_version < 2 {
            Self::migrate(&mut conn, 2).await?;
        }

        Ok(())
    }

    /// Apply one migration inside a transaction so a partial failure leaves nothing behind
    async fn migrate(conn: &mut SqliteConnection, version: i32) -> Result<()> {
        tracing::info!(version, "Applying database migration");

        sqlx::query("BEGIN")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to begin transaction: {}",
                    e
                )))
            })?;

        let result = async {
            match version {
                1 => Self::create_records_schema(&mut *conn).await?,
                2 => Self::create_pool_schema(&mut *conn).await?,
                other => {
                    return Err(Error::Database(DatabaseError::MigrationFailed(format!(
                        "Unknown migration v{}",
                        other
                    ))));
                }
            }
            Self::record_migration(&mut *conn, version).await
        }
        .await;

        match result {
            Ok(()) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::MigrationFailed(format!(
                            "Failed to commit migration v{}: {}",
                            version, e
                        )))
                    })?;
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                return Err(e);
            }
        }

        tracing::info!(version, "Database migration complete");
        Ok(())
    }

    /// Migration v1: authors and books
    async fn create_records_schema(conn: &mut SqliteConnection) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT,
                author_name TEXT NOT NULL,
                author_link TEXT,
                is_scraped TEXT CHECK (is_scraped IN ('no', 'yes')),
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            "CREATE UNIQUE INDEX idx_authors_link ON authors(author_link)",
            "CREATE INDEX idx_authors_external ON authors(external_id)",
            "CREATE INDEX idx_authors_scraped ON authors(is_scraped)",
            r#"
            CREATE TABLE books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES authors(id),
                title TEXT NOT NULL,
                author_name TEXT,
                remote_author_id TEXT,
                category TEXT,
                category_id INTEGER,
                book_link TEXT NOT NULL,
                content TEXT NOT NULL,
                is_posted INTEGER NOT NULL DEFAULT 0,
                remote_id TEXT,
                posted_at INTEGER,
                created_at INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX idx_books_posted ON books(is_posted, id)",
            "CREATE INDEX idx_books_author ON books(author_id)",
        ];

        Self::execute_all(conn, &statements).await
    }

    /// Migration v2: credential pool and category table
    async fn create_pool_schema(conn: &mut SqliteConnection) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE credentials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT,
                token TEXT NOT NULL UNIQUE,
                is_verified INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE categories (
                id INTEGER PRIMARY KEY,
                label TEXT NOT NULL UNIQUE
            )
            "#,
        ];

        Self::execute_all(conn, &statements).await
    }

    async fn execute_all(conn: &mut SqliteConnection, statements: &[&str]) -> Result<()> {
        for statement in statements {
            sqlx::query(*statement)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::MigrationFailed(format!(
                        "Failed to apply schema statement: {}",
                        e
                    )))
                })?;
        }
        Ok(())
    }

    /// Record migration version
    async fn record_migration(conn: &mut SqliteConnection, version: i32) -> Result<()> {
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to record migration: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
