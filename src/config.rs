//! Configuration types for bookshelf-sync

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Main configuration for [`SyncPipeline`](crate::SyncPipeline)
///
/// Every section has defaults except the spreadsheet source, which falls back to
/// an exported `authors.json` next to the working directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record store location
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Where author rows come from
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Catalog client settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Publishing sink settings
    #[serde(default)]
    pub publish: PublishConfig,

    /// Credential pool source
    #[serde(default)]
    pub credentials: CredentialConfig,
}

impl Config {
    /// Load a JSON configuration document and validate it
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        parse_url("publish.endpoint", &self.publish.endpoint)?;

        if let SheetSource::Directory(dir) = &self.sheet.source {
            parse_url("sheet.url", &dir.url)?;
            if dir.page_size == 0 {
                return Err(Error::config("sheet.page_size", "must be at least 1"));
            }
            if dir.max_pages == 0 {
                return Err(Error::config("sheet.max_pages", "must be at least 1"));
            }
        }

        if let CredentialConfig::Static { tokens } = &self.credentials
            && tokens.iter().any(|t| t.trim().is_empty())
        {
            return Err(Error::config(
                "credentials.tokens",
                "static tokens must not be blank",
            ));
        }

        Ok(())
    }
}

fn parse_url(key: &str, value: &str) -> Result<url::Url> {
    url::Url::parse(value).map_err(|e| Error::config(key, format!("invalid URL {value:?}: {e}")))
}

/// Record store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database path (default: "bookshelf.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Spreadsheet source configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Which source to read
    #[serde(flatten)]
    pub source: SheetSource,
}

/// Spreadsheet source variants
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetSource {
    /// Worksheet exported as a JSON array of rows
    JsonFile {
        /// Path to the export
        path: PathBuf,
    },
    /// Paginated author directory of the publishing platform
    Directory(DirectoryConfig),
}

impl Default for SheetSource {
    fn default() -> Self {
        SheetSource::JsonFile {
            path: PathBuf::from("authors.json"),
        }
    }
}

/// Paginated author directory settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory endpoint
    pub url: String,

    /// `userId` sent with every page request
    #[serde(default)]
    pub user_id: i64,

    /// `device` sent with every page request (default: 1)
    #[serde(default = "default_device")]
    pub device: i64,

    /// Authors per page (default: 200)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard stop on pagination (default: 99)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Request timeout (default: 30 seconds)
    #[serde(default = "default_http_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

/// Catalog client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Request timeout (default: 30 seconds)
    #[serde(default = "default_http_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User agent sent to the catalog
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Emit one book per detail page instead of one aggregated book (default: false)
    #[serde(default)]
    pub multi_page: bool,

    /// Exact label → category id table, checked before keyword rules
    ///
    /// Replaces the stored category table each time a pipeline is built.
    #[serde(default)]
    pub categories: Vec<CategoryLabel>,

    /// Category id used when nothing matches (default: 20)
    #[serde(default = "default_category_id")]
    pub default_category_id: i64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
            user_agent: default_user_agent(),
            multi_page: false,
            categories: Vec::new(),
            default_category_id: default_category_id(),
        }
    }
}

/// One entry of the category table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    /// Publishing-platform category id
    pub id: i64,
    /// Catalog label
    pub label: String,
}

/// Publishing sink configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Book creation endpoint
    #[serde(default = "default_publish_endpoint")]
    pub endpoint: String,

    /// `Origin`/`Referer` base sent with posts
    #[serde(default)]
    pub origin: Option<String>,

    /// Request timeout (default: 60 seconds)
    #[serde(default = "default_publish_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Category label whose books are published as part of an unfinished series
    #[serde(default = "default_incomplete_series_label")]
    pub incomplete_series_label: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            endpoint: default_publish_endpoint(),
            origin: None,
            timeout: default_publish_timeout(),
            incomplete_series_label: default_incomplete_series_label(),
        }
    }
}

/// Credential pool source
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialConfig {
    /// Verified credentials kept in the record store
    #[default]
    Store,
    /// Fixed token list
    Static {
        /// Tokens
        tokens: Vec<String>,
    },
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("bookshelf.db")
}

fn default_device() -> i64 {
    1
}

fn default_page_size() -> u32 {
    200
}

fn default_max_pages() -> u32 {
    99
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_publish_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_user_agent() -> String {
    concat!("bookshelf-sync/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_category_id() -> i64 {
    20
}

fn default_publish_endpoint() -> String {
    "https://api.bookspointer.com/admin/create-book".to_string()
}

fn default_incomplete_series_label() -> String {
    "অসম্পূর্ণ বই".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
