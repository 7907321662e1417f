//! One pipeline run
//!
//! Loads a JSON configuration (first argument, default `bookshelf.json`),
//! prints pipeline events as they happen and a summary of each stage.

use bookshelf_sync::{Config, Event, SyncPipeline};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("bookshelf.json"));

    let config = Config::load(&path).await?;
    let pipeline = SyncPipeline::from_config(config).await?;

    let mut events = pipeline.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::StageStarted { stage } => println!("== {stage}"),
                Event::StageFinished { stage, failed } => {
                    println!("== {stage} {}", if failed { "failed" } else { "done" });
                }
                Event::RowSkipped { row, error, .. } => println!("  row {row} skipped: {error}"),
                Event::BookCreated { title, .. } => println!("  + {title}"),
                Event::HarvestFailed {
                    author_id, error, ..
                } => println!("  author {author_id} failed: {error}"),
                Event::BookPosted {
                    title, remote_id, ..
                } => println!("  posted {title} as {remote_id}"),
                Event::PostFailed { title, error, .. } => {
                    println!("  failed to post {title}: {error}")
                }
                _ => {}
            }
        }
    });

    let report = pipeline.run().await;
    drop(pipeline);
    printer.await?;

    match &report.reconcile {
        Ok(r) => println!(
            "reconcile: {} rows, {} new, {} skipped",
            r.rows,
            r.created,
            r.failures.len()
        ),
        Err(e) => println!("reconcile failed: {e}"),
    }
    match &report.harvest {
        Ok(r) => println!(
            "harvest: {} authors scraped, {} books created, {} authors failed",
            r.authors_scraped,
            r.books_created,
            r.failures.len()
        ),
        Err(e) => println!("harvest failed: {e}"),
    }
    match &report.sweep {
        Ok(r) => println!(
            "sweep: {} of {} books posted, {} failed",
            r.posted,
            r.pending,
            r.failures.len()
        ),
        Err(e) => println!("sweep failed: {e}"),
    }

    Ok(())
}
