//! Domain-indexed rule store and its TTL lookup cache.
//!
//! See `schema.rs` for the SQLite-backed index and `cache.rs` for the
//! short-TTL result cache that sits in front of it.

mod cache;
mod error;
mod schema;

pub use cache::CacheOptions;
pub use error::StoreError;
pub use schema::{IngestReport, Store};
