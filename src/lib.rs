//! # bookshelf-sync
//!
//! Keeps book and author metadata in step between a curated author
//! spreadsheet, a scraped catalog site, and a remote publishing API.
//!
//! ## Design
//!
//! The crate is a library built around a [`SyncPipeline`] with three stages:
//! - **Reconciliation** upserts spreadsheet rows as authors
//! - **Harvest** expands every unscraped author's catalog listing into books
//! - **Sweep** posts every unposted book with a randomly drawn credential
//!
//! Progress lives in the record store as flags (`is_scraped`, `is_posted`),
//! so every stage can be re-run at any time and only does outstanding work.
//! Collaborators sit behind traits ([`RecordStore`], [`SpreadsheetSource`],
//! [`CatalogSource`], [`CredentialPool`], [`PublisherFactory`]) and are handed
//! to the pipeline as `Arc<dyn Trait>`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bookshelf_sync::{Config, SyncPipeline};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load(Path::new("bookshelf.json")).await?;
//!     let pipeline = SyncPipeline::from_config(config).await?;
//!
//!     // Subscribe to events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let report = pipeline.run().await;
//!     println!("failed stages: {:?}", report.failed_stages());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog listings and book details
pub mod catalog;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Synchronization pipeline
pub mod pipeline;
/// Publishing sink
pub mod publish;
/// Spreadsheet sources
pub mod sheet;
/// Record store and credential pool seams
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogSource, CategoryResolver, HttpCatalog};
pub use config::Config;
pub use db::Database;
pub use error::{DatabaseError, Error, Result};
pub use pipeline::{
    Collaborators, HarvestReport, ReconcileReport, RunReport, SweepReport, SyncPipeline,
};
pub use publish::{HttpPublisherFactory, Publisher, PublisherFactory};
pub use sheet::{DirectorySheet, JsonFileSheet, SpreadsheetSource};
pub use store::{CredentialPool, RecordStore, StaticCredentials};
pub use types::{
    Author, AuthorId, AuthorRow, Book, BookId, Credential, Event, ListingRef, NewAuthor, NewBook,
    PostReceipt, ScrapeState, Stage, UpsertOutcome,
};
