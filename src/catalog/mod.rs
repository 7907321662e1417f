//! Catalog source: author listings and book details
//!
//! [`CatalogSource`] is the seam the harvest stage consumes. [`HttpCatalog`]
//! reads the catalog's JSON endpoints and expands each detail record into
//! [`NewBook`]s, either one aggregated book or one book per page.

mod category;
mod http;
mod normalize;

pub use category::CategoryResolver;
pub use http::HttpCatalog;
pub use normalize::{split_listing_title, strip_numeral_prefix};

use crate::Result;
use crate::types::{Author, ListingRef, NewBook};
use async_trait::async_trait;

/// Read-only access to the scraped catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Listing of the books the catalog shows for an author page
    async fn list_books(&self, author_link: &str) -> Result<Vec<ListingRef>>;

    /// Expand one listing entry into zero or more books owned by `author`
    ///
    /// An entry whose pages carry no content expands to nothing.
    async fn book_details(&self, listing: &ListingRef, author: &Author) -> Result<Vec<NewBook>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
