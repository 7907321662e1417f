//! Author reconciliation: spreadsheet rows → store

use super::{ReconcileReport, RowFailure, SyncPipeline};
use crate::types::{Author, AuthorRow, Event, NewAuthor, UpsertOutcome};
use crate::{Error, Result};
use tracing::{debug, info, warn};

impl SyncPipeline {
    /// Fetch the spreadsheet rows and reconcile them
    ///
    /// # Errors
    ///
    /// Fails as a whole only when the spreadsheet cannot be read.
    pub async fn reconcile_from_sheet(&self) -> Result<ReconcileReport> {
        let rows = self.sheet.fetch_authors().await?;
        info!(source = self.sheet.name(), rows = rows.len(), "fetched author rows");
        Ok(self.reconcile(rows).await)
    }

    /// Upsert every row as an author
    ///
    /// Rows are keyed by catalog link, falling back to the external id. A row
    /// that cannot be stored is reported and skipped; the remaining rows still
    /// go through. Running the same rows twice leaves the store as one run does.
    pub async fn reconcile(&self, rows: Vec<AuthorRow>) -> ReconcileReport {
        let mut report = ReconcileReport {
            rows: rows.len(),
            ..Default::default()
        };

        for (index, row) in rows.iter().enumerate() {
            let position = index + 1;
            match self.reconcile_row(position, row).await {
                Ok((author, outcome)) => {
                    match outcome {
                        UpsertOutcome::Created => report.created += 1,
                        UpsertOutcome::Updated => report.updated += 1,
                        UpsertOutcome::Unchanged => report.unchanged += 1,
                    }
                    debug!(
                        row = position,
                        author_id = %author.id,
                        outcome = ?outcome,
                        "author reconciled"
                    );
                    self.emit_event(Event::AuthorReconciled {
                        author_id: author.id,
                        name: author.name,
                        outcome,
                    });
                }
                Err(e) => {
                    warn!(row = position, code = e.error_code(), error = %e, "author row skipped");
                    self.emit_event(Event::RowSkipped {
                        row: position,
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                    report.failures.push(RowFailure {
                        row: position,
                        name: row.author_name.clone(),
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            rows = report.rows,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failures.len(),
            "reconciliation finished"
        );
        report
    }

    async fn reconcile_row(
        &self,
        position: usize,
        row: &AuthorRow,
    ) -> Result<(Author, UpsertOutcome)> {
        let author = new_author(position, row)?;
        self.store.upsert_author(&author).await
    }
}

/// Validate a row into store fields
fn new_author(position: usize, row: &AuthorRow) -> Result<NewAuthor> {
    let non_blank = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let name = row.author_name.trim();
    if name.is_empty() {
        return Err(Error::InvalidRow {
            row: position,
            reason: "author name is blank".to_string(),
        });
    }

    let link = non_blank(row.author_link.as_deref());
    let external_id = non_blank(row.external_id.as_deref());
    if link.is_none() && external_id.is_none() {
        return Err(Error::InvalidRow {
            row: position,
            reason: format!("{name:?} has neither author link nor id"),
        });
    }

    Ok(NewAuthor {
        external_id,
        name: name.to_string(),
        link,
    })
}
