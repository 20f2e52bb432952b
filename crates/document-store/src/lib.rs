//! Versioned JSON document persistence.
//!
//! Every inventory entity (an inbound entry, a location entry, an audit
//! record, ...) is stored as one [`Document`]. A document is the unit of
//! atomicity: writers read it, change it and put it back with the version
//! they read, and a concurrent writer loses with
//! [`DocumentStoreError::ConcurrencyConflict`].

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use document::{Document, Version};
pub use error::{DocumentStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::DocumentQuery;
pub use store::{DocumentStore, DocumentStoreExt, DocumentStream, PutOptions};
