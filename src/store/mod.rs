//! Record store and credential pool seams
//!
//! The pipeline only talks to [`RecordStore`] and [`CredentialPool`]; the SQLite
//! [`Database`](crate::db::Database) implements both, and [`StaticCredentials`]
//! stands in for the pool when tokens come from configuration.

mod sqlite;
mod static_pool;
mod traits;

pub use static_pool::StaticCredentials;
pub use traits::{CredentialPool, RecordStore};
