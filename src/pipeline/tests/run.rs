use super::doubles::{BrokenStore, FakeCatalog, FakePublisherFactory, Harness};
use crate::Error;
use crate::config::{CategoryLabel, Config};
use crate::db::Database;
use crate::pipeline::SyncPipeline;
use crate::types::{AuthorRow, Event, Stage};
use std::sync::Arc;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_full_run_moves_rows_to_posted_books() {
    let catalog = FakeCatalog::default().with_book("a1", "b1", &["Debi", "Nishithini"]);
    let h = Harness::new(
        Some(vec![AuthorRow::new("a1", "Jane Doe")]),
        catalog,
        &["t1", "t2"],
        FakePublisherFactory::default(),
    )
    .await;

    let report = h.pipeline.run().await;

    assert!(report.failed_stages().is_empty());
    assert!(report.is_clean());
    assert_eq!(report.reconcile.as_ref().unwrap().created, 1);
    assert_eq!(report.harvest.as_ref().unwrap().books_created, 2);
    assert_eq!(report.sweep.as_ref().unwrap().posted, 2);
    assert!(h.db.list_books_by_posted(false).await.unwrap().is_empty());

    // a second run finds nothing left to do
    let again = h.pipeline.run().await;
    assert_eq!(again.reconcile.as_ref().unwrap().unchanged, 1);
    assert_eq!(again.harvest.as_ref().unwrap().authors_selected, 0);
    assert_eq!(again.sweep.as_ref().unwrap().pending, 0);
    assert_eq!(h.publisher.calls().len(), 2);
}

#[tokio::test]
async fn test_failed_sheet_still_runs_later_stages() {
    let catalog = FakeCatalog::default().with_book("a1", "b1", &["Debi"]);
    let h = Harness::new(None, catalog, &["t1"], FakePublisherFactory::default()).await;
    h.author("a1", "Jane Doe").await;
    let mut events = h.pipeline.subscribe();

    let report = h.pipeline.run().await;

    assert_eq!(report.failed_stages(), vec![Stage::Reconcile]);
    assert_eq!(report.harvest.as_ref().unwrap().books_created, 1);
    assert_eq!(report.sweep.as_ref().unwrap().posted, 1);

    let mut finished = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let Event::StageFinished { stage, failed } = event {
            finished.push((stage, failed));
        }
    }
    assert_eq!(
        finished,
        vec![
            (Stage::Reconcile, true),
            (Stage::Harvest, false),
            (Stage::Sweep, false)
        ]
    );
}

#[tokio::test]
async fn test_broken_store_fails_every_stage_without_panicking() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Arc::new(Database::new(temp_file.path()).await.unwrap());
    let h = Harness::with_store(
        temp_file,
        db,
        Arc::new(BrokenStore),
        Some(vec![AuthorRow::new("a1", "Jane Doe")]),
        FakeCatalog::default(),
        &["t1"],
        FakePublisherFactory::default(),
    );

    let report = h.pipeline.run().await;

    // row-level upsert failures do not fail reconciliation itself
    let reconcile = report.reconcile.as_ref().unwrap();
    assert_eq!(reconcile.failures.len(), 1);
    assert_eq!(reconcile.failures[0].code, "database_query_failed");
    assert!(matches!(report.harvest, Err(Error::Database(_))));
    assert!(matches!(report.sweep, Err(Error::Database(_))));
    assert_eq!(report.failed_stages(), vec![Stage::Harvest, Stage::Sweep]);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_empty_pool_is_recorded_as_sweep_failure() {
    let catalog = FakeCatalog::default().with_book("a1", "b1", &["Debi"]);
    let h = Harness::new(
        Some(vec![AuthorRow::new("a1", "Jane Doe")]),
        catalog,
        &[],
        FakePublisherFactory::default(),
    )
    .await;

    let report = h.pipeline.run().await;

    assert!(report.reconcile.is_ok());
    assert!(report.harvest.is_ok());
    assert!(matches!(report.sweep, Err(Error::NoCredentials)));
    assert_eq!(h.db.list_books_by_posted(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rebuilding_from_config_replaces_category_table() {
    let temp_file = NamedTempFile::new().unwrap();
    let mut config = Config::default();
    config.persistence.database_path = temp_file.path().to_path_buf();
    config.catalog.categories = vec![
        CategoryLabel {
            id: 1,
            label: "History".to_string(),
        },
        CategoryLabel {
            id: 4,
            label: "Poetry".to_string(),
        },
    ];
    drop(SyncPipeline::from_config(config.clone()).await.unwrap());

    // History moves to another id, Poetry is gone
    config.catalog.categories = vec![CategoryLabel {
        id: 2,
        label: "History".to_string(),
    }];
    drop(SyncPipeline::from_config(config).await.unwrap());

    let db = Database::new(temp_file.path()).await.unwrap();
    let categories = db.list_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, 2);
    assert_eq!(categories[0].label, "History");
    db.close().await;
}
