//! Spreadsheet sources of author rows
//!
//! Two sources ship with the crate: an exported worksheet read from a JSON file
//! ([`JsonFileSheet`]) and the publishing platform's paginated author directory
//! ([`DirectorySheet`]).

mod directory;
mod json_file;

pub use directory::DirectorySheet;
pub use json_file::JsonFileSheet;

use crate::Result;
use crate::config::{SheetConfig, SheetSource};
use crate::types::AuthorRow;
use async_trait::async_trait;
use std::sync::Arc;

/// Producer of the author rows that reconciliation upserts
#[async_trait]
pub trait SpreadsheetSource: Send + Sync {
    /// Fetch every author row, in source order
    ///
    /// # Errors
    ///
    /// An unreachable or unreadable source fails as a whole; reconciliation then
    /// reports a stage-level failure.
    async fn fetch_authors(&self) -> Result<Vec<AuthorRow>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Build the source described by the configuration
pub fn from_config(config: &SheetConfig) -> Result<Arc<dyn SpreadsheetSource>> {
    Ok(match &config.source {
        SheetSource::JsonFile { path } => Arc::new(JsonFileSheet::new(path.clone())),
        SheetSource::Directory(dir) => Arc::new(DirectorySheet::new(dir.clone())?),
    })
}
