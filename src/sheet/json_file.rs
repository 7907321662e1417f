//! Worksheet exported as JSON

use super::SpreadsheetSource;
use crate::types::AuthorRow;
use crate::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads author rows from a JSON export of the worksheet
///
/// The document is either an array of row objects or an object with an
/// `authors` array. Column names are matched leniently (`id` / `author_id`,
/// `full_name` / `author_name`, `author_link`); unknown columns such as
/// `is_scraped` are ignored.
#[derive(Clone, Debug)]
pub struct JsonFileSheet {
    path: PathBuf,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Document {
    Rows(Vec<AuthorRow>),
    Wrapped { authors: Vec<AuthorRow> },
}

impl JsonFileSheet {
    /// Source reading the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SpreadsheetSource for JsonFileSheet {
    async fn fetch_authors(&self) -> Result<Vec<AuthorRow>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read sheet {}: {}", self.path.display(), e),
            ))
        })?;

        let rows = match serde_json::from_str::<Document>(&raw)? {
            Document::Rows(rows) => rows,
            Document::Wrapped { authors } => authors,
        };

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "read sheet export");
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_row_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.json");
        tokio::fs::write(
            &path,
            r#"[{"author_link": "a1", "author_name": "Jane Doe", "is_scraped": "FALSE"}]"#,
        )
        .await
        .unwrap();

        let rows = JsonFileSheet::new(&path).fetch_authors().await.unwrap();
        assert_eq!(rows, vec![AuthorRow::new("a1", "Jane Doe")]);
    }

    #[tokio::test]
    async fn test_reads_wrapped_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.json");
        tokio::fs::write(
            &path,
            r#"{"authors": [{"id": 5, "full_name": "John Roe"}]}"#,
        )
        .await
        .unwrap();

        let rows = JsonFileSheet::new(&path).fetch_authors().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].external_id.as_deref(), Some("5"));
        assert_eq!(rows[0].author_name, "John Roe");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = JsonFileSheet::new(dir.path().join("absent.json"));

        assert!(matches!(sheet.fetch_authors().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_malformed_export_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authors.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let result = JsonFileSheet::new(&path).fetch_authors().await;
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
