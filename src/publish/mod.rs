//! Publishing sink: posting books to the external platform
//!
//! A sweep asks the [`PublisherFactory`] for a fresh [`Publisher`] per book,
//! scoped to the credential drawn for that book. Publishers are never reused
//! across books.

mod http;

pub use http::{HttpPublisher, HttpPublisherFactory};

use crate::Result;
use crate::types::{Book, Credential, PostReceipt};
use async_trait::async_trait;

/// Client posting books under one credential
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Post one book
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`](crate::Error::Rejected) when the sink answered but did
    /// not accept the book; transport failures surface as
    /// [`Error::Network`](crate::Error::Network).
    async fn post(&self, book: &Book) -> Result<PostReceipt>;
}

/// Builds credential-scoped publishers
pub trait PublisherFactory: Send + Sync {
    /// New publisher bound to `credential`
    fn client(&self, credential: &Credential) -> Result<Box<dyn Publisher>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
