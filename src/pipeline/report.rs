//! Stage and run reports

use crate::Result;
use crate::types::{AuthorId, BookId, Stage};
use serde::Serialize;
use std::collections::BTreeMap;

/// Spreadsheet row that was skipped
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowFailure {
    /// 1-based row position
    pub row: usize,
    /// Author name on the row, possibly blank
    pub name: String,
    /// Machine-readable error code
    pub code: String,
    /// Error message
    pub error: String,
}

/// Outcome of reconciliation
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Rows read from the source
    pub rows: usize,
    /// Authors inserted
    pub created: usize,
    /// Authors whose name or external id changed
    pub updated: usize,
    /// Rows that matched a stored author exactly
    pub unchanged: usize,
    /// Rows that were skipped
    pub failures: Vec<RowFailure>,
}

/// Author whose harvest aborted
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthorFailure {
    /// Store id
    pub author_id: AuthorId,
    /// Author name
    pub name: String,
    /// Machine-readable error code
    pub code: String,
    /// Error message
    pub error: String,
}

/// Outcome of harvest
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HarvestReport {
    /// Unscraped authors selected from the store
    pub authors_selected: usize,
    /// Authors flagged as scraped in this run
    pub authors_scraped: usize,
    /// Authors passed over for lack of a catalog link
    pub authors_skipped: usize,
    /// Books created in the store, including those of authors that later failed
    pub books_created: usize,
    /// Authors whose harvest aborted
    pub failures: Vec<AuthorFailure>,
}

impl HarvestReport {
    /// Whether the store gained books in this run
    pub fn books_updated(&self) -> bool {
        self.books_created > 0
    }
}

/// Book that was not posted
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PostFailure {
    /// Store id
    pub book_id: BookId,
    /// Title
    pub title: String,
    /// Fingerprint of the credential used
    pub credential: String,
    /// Machine-readable error code
    pub code: String,
    /// Error message
    pub error: String,
}

/// Per-credential counters of one sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CredentialStats {
    /// Books the credential was drawn for
    pub attempts: usize,
    /// Posts the sink accepted
    pub accepted: usize,
    /// Posts that failed for any reason
    pub rejected: usize,
}

/// Outcome of a publish sweep
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Unposted books found at the start of the sweep
    pub pending: usize,
    /// Credentials in the pool snapshot
    pub pool_size: usize,
    /// Books accepted and marked posted
    pub posted: usize,
    /// Books accepted by the sink whose posted flag could not be written
    ///
    /// These stay unposted in the store and are posted again by a later sweep.
    pub posted_unrecorded: usize,
    /// Books not accepted
    pub failures: Vec<PostFailure>,
    /// Counters keyed by credential fingerprint
    pub credentials: BTreeMap<String, CredentialStats>,
}

/// Outcome of a full pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// Reconciliation outcome
    pub reconcile: Result<ReconcileReport>,
    /// Harvest outcome
    pub harvest: Result<HarvestReport>,
    /// Sweep outcome
    pub sweep: Result<SweepReport>,
}

impl RunReport {
    /// Stages that failed as a whole
    pub fn failed_stages(&self) -> Vec<Stage> {
        let mut failed = Vec::new();
        if self.reconcile.is_err() {
            failed.push(Stage::Reconcile);
        }
        if self.harvest.is_err() {
            failed.push(Stage::Harvest);
        }
        if self.sweep.is_err() {
            failed.push(Stage::Sweep);
        }
        failed
    }

    /// Whether every stage completed without stage-level or record-level failures
    pub fn is_clean(&self) -> bool {
        let reconcile = matches!(&self.reconcile, Ok(r) if r.failures.is_empty());
        let harvest = matches!(&self.harvest, Ok(r) if r.failures.is_empty());
        let sweep = matches!(&self.sweep, Ok(r) if r.failures.is_empty() && r.posted_unrecorded == 0);
        reconcile && harvest && sweep
    }
}
