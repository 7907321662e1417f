//! Book harvest: unscraped authors → catalog → books

use super::{AuthorFailure, HarvestReport, SyncPipeline};
use crate::types::{Author, Event, ScrapeState};
use crate::{Error, Result};
use tracing::{debug, info, warn};

impl SyncPipeline {
    /// Harvest every author that is not scraped yet
    ///
    /// Each author is processed by [`harvest_author`](Self::harvest_author);
    /// a failing author is reported and stays unscraped while the others
    /// continue.
    ///
    /// # Errors
    ///
    /// Fails as a whole only when the store cannot be queried.
    pub async fn harvest(&self) -> Result<HarvestReport> {
        let authors = self.store.query_authors(ScrapeState::No).await?;
        let mut report = HarvestReport {
            authors_selected: authors.len(),
            ..Default::default()
        };
        info!(authors = authors.len(), "harvesting unscraped authors");

        for author in authors {
            // guards against a store that ignores the flag filter
            if !author.needs_harvest() {
                continue;
            }

            if author.catalog_link().is_none() {
                debug!(author_id = %author.id, name = %author.name, "author without link skipped");
                report.authors_skipped += 1;
                self.emit_event(Event::AuthorSkipped {
                    author_id: author.id,
                    name: author.name.clone(),
                });
                continue;
            }

            let mut created = 0;
            match self.harvest_author(&author, &mut created).await {
                Ok(()) => {
                    report.authors_scraped += 1;
                    info!(author_id = %author.id, books = created, "author scraped");
                    self.emit_event(Event::AuthorScraped {
                        author_id: author.id,
                        books: created,
                    });
                }
                Err(e) => {
                    warn!(
                        author_id = %author.id,
                        name = %author.name,
                        code = e.error_code(),
                        error = %e,
                        "author harvest aborted"
                    );
                    self.emit_event(Event::HarvestFailed {
                        author_id: author.id,
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                    report.failures.push(AuthorFailure {
                        author_id: author.id,
                        name: author.name.clone(),
                        code: e.error_code().to_string(),
                        error: e.to_string(),
                    });
                }
            }
            report.books_created += created;
        }

        if report.books_updated() {
            info!(books = report.books_created, "books updated");
        }
        Ok(report)
    }

    /// Harvest one author from the start of its listing
    ///
    /// The scraped flag is set only after every listing entry was expanded and
    /// every resulting book stored. On error the flag is left alone so the
    /// author is picked up again by the next harvest; books already stored
    /// before the error remain. `created` counts the books stored so far.
    pub async fn harvest_author(&self, author: &Author, created: &mut usize) -> Result<()> {
        let link = author
            .catalog_link()
            .ok_or_else(|| Error::catalog("", format!("author {} has no catalog link", author.id)))?;

        let listing = self.catalog.list_books(link).await?;
        debug!(author_id = %author.id, entries = listing.len(), "listed author books");

        for entry in &listing {
            let books = self.catalog.book_details(entry, author).await?;
            for book in &books {
                let stored = self.store.create_book(book).await?;
                *created += 1;
                debug!(book_id = %stored.id, title = %stored.title, "book created");
                self.emit_event(Event::BookCreated {
                    book_id: stored.id,
                    author_id: author.id,
                    title: stored.title,
                });
            }
        }

        self.store
            .set_author_scraped(author.id, ScrapeState::Yes)
            .await
    }
}
