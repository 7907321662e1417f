//! Publish sweep: unposted books → publishing sink

use super::{PostFailure, SweepReport, SyncPipeline};
use crate::types::{Book, Credential, Event, PostReceipt};
use crate::{Error, Result};
use rand::seq::SliceRandom;
use tracing::{error, info, warn};

/// What happened to one book in a sweep
enum PostOutcome {
    /// Accepted and flagged as posted
    Posted(PostReceipt),
    /// Accepted, but the posted flag could not be written
    Unrecorded(PostReceipt, Error),
    /// Not accepted
    Failed(Error),
}

impl SyncPipeline {
    /// Post every unposted book
    ///
    /// The credential pool is fetched once per sweep. Each book gets a
    /// credential drawn uniformly at random from that snapshot and a fresh
    /// publisher bound to it. A failed book is reported and left unposted;
    /// there is no retry within the sweep.
    ///
    /// # Errors
    ///
    /// Fails as a whole when the store or the credential pool cannot be read,
    /// and with [`Error::NoCredentials`] when books are waiting but the pool is
    /// empty.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let pending = self.store.query_books(false).await?;
        let mut report = SweepReport {
            pending: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            info!("all books up to date");
            return Ok(report);
        }

        let pool = self.credentials.fetch_all().await?;
        report.pool_size = pool.len();
        if pool.is_empty() {
            return Err(Error::NoCredentials);
        }
        info!(
            books = pending.len(),
            credentials = pool.len(),
            source = self.credentials.name(),
            "publishing pending books"
        );

        for book in pending {
            // guards against a store that ignores the flag filter
            if book.is_posted {
                continue;
            }

            let credential = pool
                .choose(&mut rand::thread_rng())
                .cloned()
                .ok_or(Error::NoCredentials)?;
            let fingerprint = credential.fingerprint();
            let stats = report.credentials.entry(fingerprint.clone()).or_default();
            stats.attempts += 1;

            match self.post_one(&book, &credential).await {
                PostOutcome::Posted(receipt) => {
                    stats.accepted += 1;
                    report.posted += 1;
                    info!(book_id = %book.id, remote_id = %receipt.remote_id, "book posted");
                    self.emit_event(Event::BookPosted {
                        book_id: book.id,
                        title: book.title,
                        remote_id: receipt.remote_id,
                        credential: fingerprint,
                    });
                }
                PostOutcome::Unrecorded(receipt, e) => {
                    stats.accepted += 1;
                    report.posted_unrecorded += 1;
                    error!(
                        book_id = %book.id,
                        remote_id = %receipt.remote_id,
                        error = %e,
                        "book accepted but posted flag not written"
                    );
                    self.emit_event(Event::BookPosted {
                        book_id: book.id,
                        title: book.title,
                        remote_id: receipt.remote_id,
                        credential: fingerprint,
                    });
                }
                PostOutcome::Failed(e) => {
                    stats.rejected += 1;
                    warn!(
                        book_id = %book.id,
                        title = %book.title,
                        credential = %credential,
                        code = e.error_code(),
                        error = %e,
                        "failed to post book"
                    );
                    self.emit_event(Event::PostFailed {
                        book_id: book.id,
                        title: book.title.clone(),
                        credential: fingerprint.clone(),
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                    report.failures.push(PostFailure {
                        book_id: book.id,
                        title: book.title,
                        credential: fingerprint,
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            posted = report.posted,
            failed = report.failures.len(),
            unrecorded = report.posted_unrecorded,
            "sweep finished"
        );
        Ok(report)
    }

    /// Post one book under one credential and record the acceptance
    async fn post_one(&self, book: &Book, credential: &Credential) -> PostOutcome {
        let receipt = match self.publish(book, credential).await {
            Ok(receipt) => receipt,
            Err(e) => return PostOutcome::Failed(e),
        };

        match self.store.mark_book_posted(book.id, &receipt).await {
            Ok(()) => PostOutcome::Posted(receipt),
            Err(e) => PostOutcome::Unrecorded(receipt, e),
        }
    }

    async fn publish(&self, book: &Book, credential: &Credential) -> Result<PostReceipt> {
        let publisher = self.publisher.client(credential)?;
        publisher.post(book).await
    }
}
