//! Synchronization pipeline
//!
//! Three stages move records from the spreadsheet through the store and the
//! catalog to the publishing sink:
//! - [`reconcile`](SyncPipeline::reconcile) upserts spreadsheet rows as authors
//! - [`harvest`](SyncPipeline::harvest) turns unscraped authors' listings into books
//! - [`sweep`](SyncPipeline::sweep) posts unposted books with a random credential
//!
//! Every stage is driven by store flags only, so re-running a stage picks up
//! exactly the work that is still outstanding. [`run`](SyncPipeline::run)
//! executes the stages in order and never stops early.

mod harvest;
mod reconcile;
mod report;
mod sweep;

pub use report::{
    AuthorFailure, CredentialStats, HarvestReport, PostFailure, ReconcileReport, RowFailure,
    RunReport, SweepReport,
};

use crate::Result;
use crate::catalog::{CatalogSource, CategoryResolver, HttpCatalog};
use crate::config::{Config, CredentialConfig};
use crate::db::Database;
use crate::publish::{HttpPublisherFactory, PublisherFactory};
use crate::sheet::{self, SpreadsheetSource};
use crate::store::{CredentialPool, RecordStore, StaticCredentials};
use crate::types::{Event, Stage};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Collaborator handles the pipeline is built from
#[derive(Clone)]
pub struct Collaborators {
    /// Source of author rows
    pub sheet: Arc<dyn SpreadsheetSource>,
    /// Canonical record store
    pub store: Arc<dyn RecordStore>,
    /// Catalog listings and details
    pub catalog: Arc<dyn CatalogSource>,
    /// Publishing credentials
    pub credentials: Arc<dyn CredentialPool>,
    /// Builds one publisher per posted book
    pub publisher: Arc<dyn PublisherFactory>,
}

/// Flag-driven synchronization pipeline
pub struct SyncPipeline {
    sheet: Arc<dyn SpreadsheetSource>,
    store: Arc<dyn RecordStore>,
    catalog: Arc<dyn CatalogSource>,
    credentials: Arc<dyn CredentialPool>,
    publisher: Arc<dyn PublisherFactory>,
    /// Event broadcast channel sender (multiple subscribers supported)
    event_tx: broadcast::Sender<Event>,
}

impl SyncPipeline {
    /// Pipeline over explicit collaborators
    pub fn new(collaborators: Collaborators) -> Self {
        let Collaborators {
            sheet,
            store,
            catalog,
            credentials,
            publisher,
        } = collaborators;
        let (event_tx, _rx) = broadcast::channel(1000);

        Self {
            sheet,
            store,
            catalog,
            credentials,
            publisher,
            event_tx,
        }
    }

    /// Pipeline over the SQLite store and the HTTP collaborators
    ///
    /// Opens (and migrates) the database, replaces the category table with the
    /// configured labels, and builds the catalog resolver from that table.
    pub async fn from_config(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        db.replace_categories(&config.catalog.categories).await?;
        let resolver =
            CategoryResolver::new(db.list_categories().await?, config.catalog.default_category_id);

        let credentials: Arc<dyn CredentialPool> = match &config.credentials {
            CredentialConfig::Store => db.clone(),
            CredentialConfig::Static { tokens } => {
                Arc::new(StaticCredentials::new(tokens.iter().cloned()))
            }
        };

        info!(
            database = %config.persistence.database_path.display(),
            credentials = credentials.name(),
            "pipeline configured"
        );

        Ok(Self::new(Collaborators {
            sheet: sheet::from_config(&config.sheet)?,
            store: db,
            catalog: Arc::new(HttpCatalog::new(&config.catalog, resolver)?),
            credentials,
            publisher: Arc::new(HttpPublisherFactory::new(config.publish)),
        }))
    }

    /// Subscribe to pipeline events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run reconciliation, harvest and sweep in that order
    ///
    /// A stage that fails as a whole is recorded in the report and the next
    /// stage still runs.
    pub async fn run(&self) -> RunReport {
        let reconcile = self
            .run_stage(Stage::Reconcile, self.reconcile_from_sheet())
            .await;
        let harvest = self.run_stage(Stage::Harvest, self.harvest()).await;
        let sweep = self.run_stage(Stage::Sweep, self.sweep()).await;

        let report = RunReport {
            reconcile,
            harvest,
            sweep,
        };
        info!(failed_stages = ?report.failed_stages(), "pipeline run finished");
        report
    }

    async fn run_stage<T>(&self, stage: Stage, work: impl Future<Output = Result<T>>) -> Result<T> {
        info!(stage = %stage, "stage started");
        self.emit_event(Event::StageStarted { stage });

        let result = work.await;
        match &result {
            Ok(_) => info!(stage = %stage, "stage finished"),
            Err(e) => error!(stage = %stage, code = e.error_code(), error = %e, "stage failed"),
        }

        self.emit_event(Event::StageFinished {
            stage,
            failed: result.is_err(),
        });
        result
    }

    /// Emit an event to all subscribers
    ///
    /// With no subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
