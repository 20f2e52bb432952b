//! Collaborator traits for the placement and audit steps.
//!
//! The coordinator reaches storage and the audit trail through these
//! traits so each step can be swapped out (for instance, to inject a
//! failing step in tests).

use async_trait::async_trait;
use common::Placement;
use document_store::DocumentStore;
use domain::{
    BatchDates, InboundRecord, InboundRecordLog, InventoryError, LocationEntry, LocationKey,
    LocationStore, RecordedMove,
};

/// Adds moved stock at a placement.
#[async_trait]
pub trait LocationService: Send + Sync {
    /// Adds `quantity` of the batch at `placement`, returning the updated entry.
    async fn place(
        &self,
        key: &LocationKey,
        batch_number: &str,
        quantity: u64,
        dates: BatchDates,
        placement: &Placement,
    ) -> Result<LocationEntry, InventoryError>;
}

/// Appends moves to the audit trail.
#[async_trait]
pub trait AuditService: Send + Sync {
    async fn record(
        &self,
        key: &LocationKey,
        entry: RecordedMove,
    ) -> Result<InboundRecord, InventoryError>;
}

#[async_trait]
impl<S: DocumentStore> LocationService for LocationStore<S> {
    async fn place(
        &self,
        key: &LocationKey,
        batch_number: &str,
        quantity: u64,
        dates: BatchDates,
        placement: &Placement,
    ) -> Result<LocationEntry, InventoryError> {
        self.upsert_placement(key, batch_number, quantity, dates, placement)
            .await
    }
}

#[async_trait]
impl<S: DocumentStore> AuditService for InboundRecordLog<S> {
    async fn record(
        &self,
        key: &LocationKey,
        entry: RecordedMove,
    ) -> Result<InboundRecord, InventoryError> {
        self.append(key, entry).await
    }
}
