//! Core types for bookshelf-sync

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the inner i64 value
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
            }

            fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
                <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                Ok(Self(id))
            }
        }
    };
}

record_id!(
    /// Store-assigned identifier of an author
    AuthorId
);

record_id!(
    /// Store-assigned identifier of a book
    BookId
);

/// Harvest state of an author
///
/// Stored as `'no'` / `'yes'`; a NULL column is read as "absent" and treated
/// like [`ScrapeState::No`] by the harvest selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeState {
    /// Books not (fully) harvested yet
    No,
    /// Every listed book was submitted to the store
    Yes,
}

impl ScrapeState {
    /// Value stored in the `is_scraped` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeState::No => "no",
            ScrapeState::Yes => "yes",
        }
    }

    /// Parse a stored value; anything unknown reads as absent
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "no" | "false" => Some(ScrapeState::No),
            "yes" | "true" => Some(ScrapeState::Yes),
            _ => None,
        }
    }
}

/// Author as held by the record store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Store-assigned id
    pub id: AuthorId,
    /// Identifier of the author on the publishing platform (sheet `id` column)
    pub external_id: Option<String>,
    /// Display name
    pub name: String,
    /// Catalog link (source-of-record key)
    pub link: Option<String>,
    /// Harvest flag; `None` when never set
    pub is_scraped: Option<ScrapeState>,
    /// When the store first saw this author
    pub created_at: DateTime<Utc>,
}

impl Author {
    /// Whether harvest still has to visit this author
    pub fn needs_harvest(&self) -> bool {
        self.is_scraped != Some(ScrapeState::Yes)
    }

    /// Catalog link, if it is usable
    pub fn catalog_link(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// One author row from a spreadsheet source
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorRow {
    /// Publishing-platform id of the author, when the sheet has one
    #[serde(
        default,
        alias = "id",
        alias = "author_id",
        deserialize_with = "string_or_number::deserialize"
    )]
    pub external_id: Option<String>,
    /// Display name
    #[serde(default, alias = "full_name", alias = "name")]
    pub author_name: String,
    /// Catalog link
    #[serde(default, alias = "link")]
    pub author_link: Option<String>,
}

impl AuthorRow {
    /// Row with a link and a name
    pub fn new(author_link: impl Into<String>, author_name: impl Into<String>) -> Self {
        Self {
            external_id: None,
            author_name: author_name.into(),
            author_link: Some(author_link.into()),
        }
    }
}

/// Author fields accepted by the record store
#[derive(Clone, Debug, PartialEq)]
pub struct NewAuthor {
    /// Publishing-platform id
    pub external_id: Option<String>,
    /// Display name (never blank)
    pub name: String,
    /// Catalog link; at least one of `link` / `external_id` is set
    pub link: Option<String>,
}

/// What an author upsert did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// A new author was inserted
    Created,
    /// An existing author had its name or external id refreshed
    Updated,
    /// An existing author already matched the row
    Unchanged,
}

/// Book as held by the record store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned id
    pub id: BookId,
    /// Owning author
    pub author_id: AuthorId,
    /// Title
    pub title: String,
    /// Author name as shown by the catalog
    pub author_name: Option<String>,
    /// Publishing-platform id of the author
    pub remote_author_id: Option<String>,
    /// Category labels joined with commas
    pub category: Option<String>,
    /// Publishing-platform category id
    pub category_id: Option<i64>,
    /// Catalog page the book was harvested from
    pub book_link: String,
    /// HTML body
    pub content: String,
    /// Set once the publishing sink accepted the book
    pub is_posted: bool,
    /// Creation time in the store
    pub created_at: DateTime<Utc>,
}

/// Book fields produced by the catalog and accepted by the record store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewBook {
    /// Owning author
    pub author_id: AuthorId,
    /// Title (never blank)
    pub title: String,
    /// Author name as shown by the catalog
    pub author_name: Option<String>,
    /// Publishing-platform id of the author
    pub remote_author_id: Option<String>,
    /// Category labels joined with commas
    pub category: Option<String>,
    /// Publishing-platform category id
    pub category_id: Option<i64>,
    /// Catalog page
    pub book_link: String,
    /// HTML body
    pub content: String,
}

/// One entry of an author's catalog listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRef {
    /// Listing title
    pub title: String,
    /// Author name printed next to the title
    pub author_name: Option<String>,
    /// Link to the book's detail page
    pub link: String,
}

/// Opaque publishing token
///
/// `Debug` and `Display` print only a fingerprint so tokens never reach logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building the Authorization header
    pub fn token(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits of the token's SHA-256
    pub fn fingerprint(&self) -> String {
        let digest = format!("{:x}", Sha256::digest(self.0.as_bytes()));
        digest[..12].to_string()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&self.fingerprint()).finish()
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cred:{}", self.fingerprint())
    }
}

/// Confirmation returned by the publishing sink
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    /// Id assigned by the publishing platform
    pub remote_id: String,
}

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Spreadsheet → store
    Reconcile,
    /// Store → catalog → store
    Harvest,
    /// Store → publishing sink
    Sweep,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Reconcile => "reconcile",
            Stage::Harvest => "harvest",
            Stage::Sweep => "sweep",
        };
        f.write_str(name)
    }
}

/// Event emitted while the pipeline runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A stage started
    StageStarted {
        /// Stage
        stage: Stage,
    },

    /// A stage returned
    StageFinished {
        /// Stage
        stage: Stage,
        /// Whether the stage itself failed (per-record failures don't count)
        failed: bool,
    },

    /// A spreadsheet row reached the store
    AuthorReconciled {
        /// Store id
        author_id: AuthorId,
        /// Author name
        name: String,
        /// What the upsert did
        outcome: UpsertOutcome,
    },

    /// A spreadsheet row was skipped
    RowSkipped {
        /// 1-based row position
        row: usize,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },

    /// Harvest passed over an author that has no catalog link
    AuthorSkipped {
        /// Store id
        author_id: AuthorId,
        /// Author name
        name: String,
    },

    /// A harvested book was created in the store
    BookCreated {
        /// Store id of the new book
        book_id: BookId,
        /// Owning author
        author_id: AuthorId,
        /// Title
        title: String,
    },

    /// All of an author's listing was submitted and the flag flipped
    AuthorScraped {
        /// Store id
        author_id: AuthorId,
        /// Number of books created for this author in this run
        books: usize,
    },

    /// An author's harvest aborted; it stays unscraped
    HarvestFailed {
        /// Store id
        author_id: AuthorId,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },

    /// The sink accepted a book
    BookPosted {
        /// Store id
        book_id: BookId,
        /// Title
        title: String,
        /// Id assigned by the publishing platform
        remote_id: String,
        /// Fingerprint of the credential used
        credential: String,
    },

    /// Posting a book failed; it stays unposted
    PostFailed {
        /// Store id
        book_id: BookId,
        /// Title
        title: String,
        /// Fingerprint of the credential used
        credential: String,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },
}

mod string_or_number {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                Some(s.trim().to_string())
            }
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}
