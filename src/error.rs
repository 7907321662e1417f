//! Error types for bookshelf-sync
//!
//! The pipeline distinguishes failures by the unit that absorbs them:
//! - row-level ([`Error::InvalidRow`]) failures are skipped by reconciliation
//! - author-level failures abort one author's harvest
//! - book-level failures ([`Error::Rejected`] and transport errors) abort one post
//! - anything surfacing from a stage itself is recorded by the orchestrator
//!
//! All variants carry enough context to be reported without the caller having to
//! re-derive which record was involved.

use thiserror::Error;

/// Result type alias for bookshelf-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bookshelf-sync
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "publish.endpoint")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// A spreadsheet row could not be reconciled
    #[error("invalid author row {row}: {reason}")]
    InvalidRow {
        /// 1-based position of the row in the source sequence
        row: usize,
        /// Why the row was refused
        reason: String,
    },

    /// The catalog returned something the pipeline cannot use
    #[error("catalog error for {link}: {reason}")]
    Catalog {
        /// The catalog link that was being read
        link: String,
        /// What went wrong
        reason: String,
    },

    /// The publishing sink refused a book
    #[error("publisher rejected book: {message}")]
    Rejected {
        /// HTTP status returned by the sink, when there was one
        status: Option<u16>,
        /// Message reported by the sink
        message: String,
    },

    /// The credential pool is empty while books are waiting to be posted
    #[error("credential pool is empty")]
    NoCredentials,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate key)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a catalog error for a link
    pub fn catalog(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Catalog {
            link: link.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error code
    ///
    /// Stable across releases; used in [`crate::types::Event`] payloads and reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(e) => match e {
                DatabaseError::ConnectionFailed(_) => "database_connection_failed",
                DatabaseError::MigrationFailed(_) => "database_migration_failed",
                DatabaseError::QueryFailed(_) => "database_query_failed",
                DatabaseError::NotFound(_) => "record_not_found",
                DatabaseError::ConstraintViolation(_) => "constraint_violation",
            },
            Error::InvalidRow { .. } => "invalid_row",
            Error::Catalog { .. } => "catalog_error",
            Error::Rejected { .. } => "rejected",
            Error::NoCredentials => "no_credentials",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }
}
