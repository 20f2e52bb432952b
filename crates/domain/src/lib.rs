//! Domain layer for the warehouse inventory system.
//!
//! This crate holds the batch lifecycle:
//! - `InboundLedger` for received stock awaiting placement
//! - `LocationStore` for placed stock, reductions and zone transfers
//! - `InboundRecordLog`, the append-only trail of completed moves
//! - `ProductCatalog` and `StorageRegistry` for reference data
//!
//! Every entity is one document in a [`document_store::DocumentStore`] and
//! every write is checked against the version it was read at.

pub mod audit;
pub mod batch;
pub mod entity;
pub mod error;
pub mod inbound;
pub mod location;
pub mod product;
pub mod registry;
pub mod repository;
pub mod stock;
pub mod time;

pub use audit::{InboundRecord, InboundRecordLog, RecordSummary, RecordedMove};
pub use batch::{Batch, BatchDates, BatchUpdate, NewBatch, add_quantity};
pub use entity::Entity;
pub use error::{InventoryError, Result};
pub use inbound::{InboundEntry, InboundLedger, Intake, ProductDetails, Received, Withdrawal};
pub use location::{LocationEntry, LocationKey, LocationStore, LocationView, Reduction, Transfer};
pub use product::{Product, ProductCatalog, ProductInput, ProductSlot};
pub use registry::{StorageCategory, StorageRegistry};
pub use repository::{Repository, Stored};
pub use stock::{StockPage, StockQuery, StockSummary};
pub use time::DateRange;
