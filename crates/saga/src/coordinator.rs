//! Move coordinator: inbound → location → audit trail.

use std::time::Instant;

use chrono::Utc;
use common::Ean;
use document_store::DocumentStore;
use domain::{
    InboundEntry, InboundLedger, InboundRecordLog, InventoryError, LocationEntry, LocationStore,
    RecordedMove, Withdrawal,
};

use crate::error::{MoveError, Result};
use crate::request::{MoveOutcome, MoveRequest};
use crate::services::{AuditService, LocationService};
use crate::state::MoveState;
use crate::steps;

/// How often crediting a withdrawal back is retried when another writer
/// touched the inbound entry in between.
const COMPENSATION_ATTEMPTS: usize = 3;

/// Orchestrates moves of received stock into storage.
///
/// The inbound entry, the location entry and the audit record are three
/// documents with no transaction spanning them. Quantity leaves inbound
/// under an optimistic version check, so two moves racing on the same
/// ean cannot both withdraw the same stock: the loser gets
/// [`InventoryError::Conflict`].
pub struct MoveCoordinator<S, L = LocationStore<S>, A = InboundRecordLog<S>>
where
    S: DocumentStore,
    L: LocationService,
    A: AuditService,
{
    inbound: InboundLedger<S>,
    locations: L,
    audit: A,
}

impl<S: DocumentStore + Clone> MoveCoordinator<S> {
    /// Creates a coordinator whose three steps all write to `store`.
    pub fn new(store: S) -> Self {
        Self::with_services(
            InboundLedger::new(store.clone()),
            LocationStore::new(store.clone()),
            InboundRecordLog::new(store),
        )
    }
}

impl<S, L, A> Clone for MoveCoordinator<S, L, A>
where
    S: DocumentStore + Clone,
    L: LocationService + Clone,
    A: AuditService + Clone,
{
    fn clone(&self) -> Self {
        Self {
            inbound: self.inbound.clone(),
            locations: self.locations.clone(),
            audit: self.audit.clone(),
        }
    }
}

impl<S, L, A> MoveCoordinator<S, L, A>
where
    S: DocumentStore,
    L: LocationService,
    A: AuditService,
{
    /// Creates a coordinator from explicit step services.
    pub fn with_services(inbound: InboundLedger<S>, locations: L, audit: A) -> Self {
        Self {
            inbound,
            locations,
            audit,
        }
    }

    /// Moves part of an inbound batch to a storage placement.
    ///
    /// Validation, a missing ean or batch and insufficient stock abort
    /// before anything is written. A placement failure credits the
    /// withdrawal back and returns the placement error. An audit failure
    /// is logged and the move still succeeds with `audit_recorded = false`.
    #[tracing::instrument(
        skip(self, request),
        fields(
            saga_type = steps::SAGA_TYPE,
            ean = %request.ean,
            batch = %request.batch_number,
            quantity = request.quantity
        )
    )]
    pub async fn execute(&self, request: MoveRequest) -> Result<MoveOutcome> {
        metrics::counter!("moves_total").increment(1);
        let started = Instant::now();

        request.validate()?;
        let mut state = MoveState::Pending;

        // 1. Withdraw from inbound
        debug_assert!(state.can_withdraw());
        tracing::info!(step = steps::STEP_WITHDRAW_INBOUND, "move step started");
        let (inbound, withdrawal) = self.withdraw(&request).await?;
        state = MoveState::Withdrawn;

        // 2. Place at the destination
        debug_assert!(state.can_place());
        tracing::info!(step = steps::STEP_PLACE_STOCK, "move step started");
        let key = request.location_key();
        let location = match self
            .locations
            .place(
                &key,
                request.batch_number(),
                request.quantity,
                request.dates,
                &request.placement,
            )
            .await
        {
            Ok(location) => location,
            Err(placement_err) => {
                tracing::warn!(
                    step = steps::STEP_PLACE_STOCK,
                    error = %placement_err,
                    "move step failed, compensating"
                );
                debug_assert!(state.can_compensate());
                let result = match self.compensate(&request.ean, &withdrawal).await {
                    Ok(_) => {
                        state = MoveState::Compensated;
                        tracing::info!(%state, "withdrawal credited back");
                        Err(MoveError::Inventory(placement_err))
                    }
                    Err(compensation) => {
                        tracing::error!(
                            placement = %placement_err,
                            compensation = %compensation,
                            "compensation failed, withdrawn stock is unaccounted for"
                        );
                        Err(MoveError::CompensationFailed {
                            placement: placement_err,
                            compensation,
                        })
                    }
                };
                metrics::histogram!("move_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
                return result;
            }
        };
        state = MoveState::Placed;

        // 3. Audit trail
        debug_assert!(state.can_record());
        tracing::info!(step = steps::STEP_RECORD_MOVE, "move step started");
        let audit_recorded = self.record(&request, &location).await;
        if audit_recorded {
            state = MoveState::Recorded;
        }

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("move_duration_seconds").record(duration);
        tracing::info!(%state, audit_recorded, duration, "move completed");

        Ok(MoveOutcome {
            state,
            inbound,
            location,
            audit_recorded,
        })
    }

    /// Takes the quantity off the inbound batch and commits it.
    async fn withdraw(
        &self,
        request: &MoveRequest,
    ) -> std::result::Result<(InboundEntry, Withdrawal), InventoryError> {
        let mut stored = self.inbound.load(&request.ean).await?;
        let withdrawal = stored.entity.withdraw(
            request.batch_number(),
            request.quantity,
            &request.placement,
            request.dates,
            Utc::now(),
        )?;
        let saved = self.inbound.save(stored).await?;
        tracing::debug!(
            version = %saved.version,
            removed = withdrawal.removed,
            "inbound batch decremented"
        );
        Ok((saved.entity, withdrawal))
    }

    /// Credits a withdrawal back onto the latest inbound entry.
    #[tracing::instrument(skip(self, withdrawal), fields(batch = %withdrawal.before.batch_number))]
    async fn compensate(
        &self,
        ean: &Ean,
        withdrawal: &Withdrawal,
    ) -> std::result::Result<InboundEntry, InventoryError> {
        metrics::counter!("move_compensations_total").increment(1);
        let mut attempt = 1;
        loop {
            let mut stored = self.inbound.load(ean).await?;
            stored.entity.restore(withdrawal, Utc::now())?;
            match self.inbound.save(stored).await {
                Ok(saved) => return Ok(saved.entity),
                Err(InventoryError::Conflict { entity }) if attempt < COMPENSATION_ATTEMPTS => {
                    tracing::warn!(%entity, attempt, "inbound entry changed during compensation");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Appends the move to the audit trail. Returns false if that failed.
    async fn record(&self, request: &MoveRequest, location: &LocationEntry) -> bool {
        let entry = RecordedMove::new(
            request.batch_number(),
            request.quantity,
            request.placement.clone(),
            request.dates,
            Utc::now(),
        );
        match self.audit.record(&location.location_key(), entry).await {
            Ok(record) => {
                tracing::debug!(moves = record.batches.len(), "move recorded");
                true
            }
            Err(err) => {
                metrics::counter!("move_audit_failures_total").increment(1);
                tracing::error!(
                    step = steps::STEP_RECORD_MOVE,
                    error = %err,
                    "audit append failed, move stays committed"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use common::Placement;
    use document_store::InMemoryDocumentStore;
    use domain::{BatchDates, Intake, LocationKey, NewBatch, ProductDetails};

    use super::*;

    fn dates() -> BatchDates {
        let now = Utc::now();
        BatchDates::new(now - Duration::days(30), now + Duration::days(90))
    }

    async fn setup(
        quantity: u64,
    ) -> (
        MoveCoordinator<InMemoryDocumentStore>,
        InboundLedger<InMemoryDocumentStore>,
        LocationStore<InMemoryDocumentStore>,
        InboundRecordLog<InMemoryDocumentStore>,
    ) {
        let store = InMemoryDocumentStore::new();
        let ledger = InboundLedger::new(store.clone());
        ledger
            .receive(Intake::new(
                ProductDetails::new("111", "Rice", false),
                vec![NewBatch::new("B1", quantity, dates())],
            ))
            .await
            .unwrap();
        (
            MoveCoordinator::new(store.clone()),
            ledger,
            LocationStore::new(store.clone()),
            InboundRecordLog::new(store),
        )
    }

    fn move_of(quantity: u64) -> MoveRequest {
        MoveRequest::new(
            LocationKey::new("111", "Rice", false),
            "B1",
            quantity,
            Placement::in_zone("Z1"),
            dates(),
        )
    }

    #[tokio::test]
    async fn test_partial_move() {
        let (coordinator, ledger, locations, records) = setup(100).await;

        let outcome = coordinator.execute(move_of(40)).await.unwrap();

        assert_eq!(outcome.state, MoveState::Recorded);
        assert!(outcome.audit_recorded);
        assert_eq!(outcome.inbound.total_quantity(), 60);
        assert_eq!(outcome.location.stock(), 40);

        let inbound = ledger.find_by_ean(&Ean::new("111")).await.unwrap();
        let remaining = inbound.find_batch("B1").unwrap();
        assert_eq!(remaining.quantity, 60);
        assert_eq!(remaining.placement, Some(Placement::in_zone("Z1")));

        assert_eq!(locations.stock_for(&Ean::new("111")).await.unwrap(), 40);
        let trail = records.list(None).await.unwrap();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].batches[0].quantity, 40);
    }

    #[tokio::test]
    async fn test_full_move_removes_inbound_line() {
        let (coordinator, ledger, locations, _) = setup(100).await;

        let outcome = coordinator.execute(move_of(100)).await.unwrap();

        assert!(outcome.inbound.batches.is_empty());
        let inbound = ledger.find_by_ean(&Ean::new("111")).await.unwrap();
        assert!(inbound.find_batch("B1").is_none());
        assert_eq!(locations.stock_for(&Ean::new("111")).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let (coordinator, ledger, locations, records) = setup(10).await;

        let result = coordinator.execute(move_of(11)).await;
        assert!(matches!(
            result,
            Err(MoveError::Inventory(InventoryError::InsufficientStock {
                requested: 11,
                available: 10
            }))
        ));

        let inbound = ledger.find_by_ean(&Ean::new("111")).await.unwrap();
        assert_eq!(inbound.total_quantity(), 10);
        assert!(locations.all_entries().await.unwrap().is_empty());
        assert!(records.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ean_and_batch() {
        let (coordinator, _, _, _) = setup(10).await;

        let mut unknown_ean = move_of(1);
        unknown_ean.ean = Ean::new("999");
        assert!(matches!(
            coordinator.execute(unknown_ean).await,
            Err(MoveError::Inventory(InventoryError::NotFound(_)))
        ));

        let mut unknown_batch = move_of(1);
        unknown_batch.batch_number = "B9".to_string();
        assert!(matches!(
            coordinator.execute(unknown_batch).await,
            Err(MoveError::Inventory(InventoryError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_first() {
        let (coordinator, _, _, _) = setup(10).await;
        assert!(matches!(
            coordinator.execute(move_of(0)).await,
            Err(MoveError::Inventory(InventoryError::Validation(_)))
        ));
    }
}
