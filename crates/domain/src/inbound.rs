//! Received-but-not-placed stock, one entry per ean.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use common::{BatchId, Ean, Placement};
use document_store::{DocumentQuery, DocumentStore};
use serde::{Deserialize, Serialize};

use crate::batch::{self, Batch, BatchDates, BatchUpdate, NewBatch, add_quantity};
use crate::entity::Entity;
use crate::error::{InventoryError, Result};
use crate::location::LocationStore;
use crate::repository::{Repository, Stored};
use crate::time::DateRange;

/// Product metadata carried on every intake. Last write wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub ean: Ean,
    pub name: String,
    #[serde(default)]
    pub net_weight: f64,
    #[serde(default)]
    pub net_weight_unit: String,
    #[serde(default)]
    pub perishable: bool,
}

impl ProductDetails {
    pub fn new(ean: impl Into<Ean>, name: impl Into<String>, perishable: bool) -> Self {
        Self {
            ean: ean.into(),
            name: name.into(),
            net_weight: 0.0,
            net_weight_unit: String::new(),
            perishable,
        }
    }

    pub fn net_weight(mut self, weight: f64, unit: impl Into<String>) -> Self {
        self.net_weight = weight;
        self.net_weight_unit = unit.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_ean(&self.ean)?;
        if self.name.trim().is_empty() {
            return Err(InventoryError::validation("name is required"));
        }
        Ok(())
    }
}

/// Rejects eans that are empty or would break key-prefix grouping.
pub fn validate_ean(ean: &Ean) -> Result<()> {
    if ean.is_empty() {
        return Err(InventoryError::validation("ean is required"));
    }
    if ean.as_str().contains('/') {
        return Err(InventoryError::validation(format!(
            "ean {ean} must not contain '/'"
        )));
    }
    Ok(())
}

/// An intake request: product metadata plus the batches received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intake {
    #[serde(flatten)]
    pub details: ProductDetails,
    pub batches: Vec<NewBatch>,
}

impl Intake {
    pub fn new(details: ProductDetails, batches: Vec<NewBatch>) -> Self {
        Self { details, batches }
    }

    fn validate(&self) -> Result<()> {
        self.details.validate()?;
        if self.batches.is_empty() {
            return Err(InventoryError::validation("at least one batch is required"));
        }
        let mut seen = HashSet::new();
        for batch in &self.batches {
            batch.validate()?;
            if !seen.insert(batch.batch_number.trim()) {
                return Err(InventoryError::duplicate(format!(
                    "batch {} appears twice in the request",
                    batch.batch_number.trim()
                )));
            }
        }
        Ok(())
    }
}

/// Received stock of one product awaiting placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEntry {
    pub ean: Ean,
    pub name: String,
    pub net_weight: f64,
    pub net_weight_unit: String,
    pub perishable: bool,
    pub batches: Vec<Batch>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for InboundEntry {
    const COLLECTION: &'static str = "inbound";

    fn key(&self) -> String {
        self.ean.to_string()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// What a withdrawal took, so it can be credited back.
#[derive(Debug, Clone, PartialEq)]
pub struct Withdrawal {
    /// The batch line as it was before the withdrawal.
    pub before: Batch,
    /// Position of the line in the entry.
    pub position: usize,
    pub quantity: u64,
    /// True when the line reached zero and was removed.
    pub removed: bool,
}

impl InboundEntry {
    pub fn new(details: &ProductDetails, now: DateTime<Utc>) -> Self {
        Self {
            ean: details.ean.clone(),
            name: details.name.trim().to_string(),
            net_weight: details.net_weight,
            net_weight_unit: details.net_weight_unit.clone(),
            perishable: details.perishable,
            batches: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_details(&mut self, details: &ProductDetails, now: DateTime<Utc>) {
        self.name = details.name.trim().to_string();
        self.net_weight = details.net_weight;
        self.net_weight_unit = details.net_weight_unit.clone();
        self.perishable = details.perishable;
        self.updated_at = now;
    }

    pub fn find_batch(&self, batch_number: &str) -> Option<&Batch> {
        self.batches.iter().find(|b| b.batch_number == batch_number)
    }

    pub fn total_quantity(&self) -> u64 {
        batch::total(self.batches.iter().map(|b| b.quantity))
    }

    /// Appends received batches, rejecting batch numbers already held.
    pub fn append_batches(&mut self, batches: Vec<NewBatch>, now: DateTime<Utc>) -> Result<()> {
        if let Some(existing) = batches
            .iter()
            .find(|new| self.find_batch(new.batch_number.trim()).is_some())
        {
            return Err(InventoryError::duplicate(format!(
                "batch {} already received for ean {}",
                existing.batch_number.trim(),
                self.ean
            )));
        }
        batches.iter().try_fold(self.total_quantity(), |sum, new| {
            add_quantity(sum, new.quantity.unwrap_or(0))
        })?;
        self.batches
            .extend(batches.into_iter().map(|new| Batch::received(new, now)));
        self.updated_at = now;
        Ok(())
    }

    /// Takes `quantity` off a batch line.
    ///
    /// A line reaching zero is removed. Otherwise the remainder is tagged
    /// with the destination placement and dates of this withdrawal.
    pub fn withdraw(
        &mut self,
        batch_number: &str,
        quantity: u64,
        placement: &Placement,
        dates: BatchDates,
        now: DateTime<Utc>,
    ) -> Result<Withdrawal> {
        let position = self
            .batches
            .iter()
            .position(|b| b.batch_number == batch_number)
            .ok_or_else(|| {
                InventoryError::not_found(format!(
                    "batch {batch_number} not found in inbound for ean {}",
                    self.ean
                ))
            })?;

        let before = self.batches[position].clone();
        if before.quantity < quantity {
            return Err(InventoryError::InsufficientStock {
                requested: quantity,
                available: before.quantity,
            });
        }

        let remaining = before.quantity - quantity;
        let removed = remaining == 0;
        if removed {
            self.batches.remove(position);
        } else {
            let batch = &mut self.batches[position];
            batch.quantity = remaining;
            batch.placement = Some(placement.clone());
            batch.set_dates(dates);
            batch.updated_at = now;
        }
        self.updated_at = now;

        Ok(Withdrawal {
            before,
            position,
            quantity,
            removed,
        })
    }

    /// Credits a withdrawal back onto the entry.
    ///
    /// A line that still exists only gets its quantity back; its placement
    /// tag and dates may belong to a later move. A removed line is
    /// re-inserted where it was.
    pub fn restore(&mut self, withdrawal: &Withdrawal, now: DateTime<Utc>) -> Result<()> {
        match self
            .batches
            .iter_mut()
            .find(|b| b.id == withdrawal.before.id)
        {
            Some(batch) => {
                batch.quantity = add_quantity(batch.quantity, withdrawal.quantity)?;
                batch.updated_at = now;
            }
            None => {
                let mut line = withdrawal.before.clone();
                line.quantity = withdrawal.quantity;
                let position = withdrawal.position.min(self.batches.len());
                self.batches.insert(position, line);
            }
        }
        self.updated_at = now;
        Ok(())
    }

    /// Applies a partial update to one batch line.
    pub fn update_batch(
        &mut self,
        batch_id: BatchId,
        update: &BatchUpdate,
        now: DateTime<Utc>,
    ) -> Result<&Batch> {
        if let Some(ref number) = update.batch_number
            && self
                .batches
                .iter()
                .any(|b| b.id != batch_id && b.batch_number == number.trim())
        {
            return Err(InventoryError::duplicate(format!(
                "batch {} already received for ean {}",
                number.trim(),
                self.ean
            )));
        }

        let ean = self.ean.clone();
        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.id == batch_id)
            .ok_or_else(|| {
                InventoryError::not_found(format!("batch {batch_id} not found for ean {ean}"))
            })?;
        update.apply_to(batch, now)?;
        self.updated_at = now;
        Ok(&*batch)
    }
}

/// Result of an intake.
#[derive(Debug, Clone)]
pub struct Received {
    pub entry: InboundEntry,
    /// True when this intake created the ean's entry.
    pub created: bool,
}

/// Holds received batches per ean and deduplicates intake.
pub struct InboundLedger<S: DocumentStore> {
    entries: Repository<S, InboundEntry>,
    locations: LocationStore<S>,
}

impl<S: DocumentStore + Clone> Clone for InboundLedger<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            locations: self.locations.clone(),
        }
    }
}

impl<S: DocumentStore + Clone> InboundLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            entries: Repository::new(store.clone()),
            locations: LocationStore::new(store),
        }
    }
}

impl<S: DocumentStore> InboundLedger<S> {
    /// Returns the repository backing the ledger.
    pub fn repository(&self) -> &Repository<S, InboundEntry> {
        &self.entries
    }

    /// Records received batches for a product.
    ///
    /// Fails with `Duplicate` when a batch number is already held in inbound
    /// for the ean, or an identical lot is already placed in a location.
    #[tracing::instrument(skip(self, intake), fields(ean = %intake.details.ean, batches = intake.batches.len()))]
    pub async fn receive(&self, intake: Intake) -> Result<Received> {
        intake.validate()?;
        let ean = intake.details.ean.clone();

        for batch in &intake.batches {
            if self
                .locations
                .has_identical_batch(&ean, batch.batch_number.trim(), &batch.dates())
                .await?
            {
                return Err(InventoryError::duplicate(format!(
                    "batch {} with identical dates is already placed for ean {ean}",
                    batch.batch_number.trim()
                )));
            }
        }

        let now = Utc::now();
        let received = intake.batches.len();
        let existing = self.entries.load(ean.as_str()).await?;
        let created = existing.is_none();

        let mut stored = existing
            .unwrap_or_else(|| Stored::fresh(InboundEntry::new(&intake.details, now)));
        stored.entity.apply_details(&intake.details, now);
        stored.entity.append_batches(intake.batches, now)?;
        let stored = self.entries.save(stored).await?;

        metrics::counter!("inbound_batches_received_total").increment(received as u64);
        tracing::info!(created, version = %stored.version, "batches received");

        Ok(Received {
            entry: stored.entity,
            created,
        })
    }

    /// Loads the entry for an ean.
    pub async fn find_by_ean(&self, ean: &Ean) -> Result<InboundEntry> {
        self.load(ean).await.map(Stored::into_inner)
    }

    /// Full batch list for an ean.
    pub async fn history(&self, ean: &Ean) -> Result<Vec<Batch>> {
        Ok(self.find_by_ean(ean).await?.batches)
    }

    /// Loads the entry together with its version, for read-modify-write callers.
    pub async fn load(&self, ean: &Ean) -> Result<Stored<InboundEntry>> {
        self.entries
            .load(ean.as_str())
            .await?
            .ok_or_else(|| InventoryError::not_found(format!("no inbound entry for ean {ean}")))
    }

    /// Writes back an entry loaded with [`InboundLedger::load`].
    pub async fn save(&self, stored: Stored<InboundEntry>) -> Result<Stored<InboundEntry>> {
        self.entries.save(stored).await
    }

    /// Entries created on a local calendar day.
    #[tracing::instrument(skip(self))]
    pub async fn list_for_day(&self, day: NaiveDate) -> Result<Vec<InboundEntry>> {
        let range = DateRange::day(day);
        let entries = self
            .entries
            .query(DocumentQuery::default().created_between(range.start, range.end))
            .await?;
        Ok(entries.into_iter().map(Stored::into_inner).collect())
    }

    /// Entries holding at least one batch received on a local calendar day.
    #[tracing::instrument(skip(self))]
    pub async fn list_batches_received_on(&self, day: NaiveDate) -> Result<Vec<InboundEntry>> {
        let range = DateRange::day(day);
        Ok(self
            .entries
            .scan()
            .await?
            .into_iter()
            .filter(|entry| entry.batches.iter().any(|b| range.contains(b.created_at)))
            .collect())
    }

    /// Partially updates one batch line.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_batch_fields(
        &self,
        ean: &Ean,
        batch_id: BatchId,
        update: BatchUpdate,
    ) -> Result<InboundEntry> {
        let mut stored = self.load(ean).await?;
        stored.entity.update_batch(batch_id, &update, Utc::now())?;
        let stored = self.entries.save(stored).await?;
        tracing::info!(%batch_id, "inbound batch updated");
        Ok(stored.entity)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use document_store::InMemoryDocumentStore;

    use super::*;
    use crate::time;

    fn dates(expiry_days: i64) -> BatchDates {
        let now = Utc::now();
        BatchDates::new(now - Duration::days(30), now + Duration::days(expiry_days))
    }

    fn details(ean: &str) -> ProductDetails {
        ProductDetails::new(ean, "Rice", false).net_weight(1.0, "kg")
    }

    fn intake(ean: &str, number: &str, quantity: u64) -> Intake {
        Intake::new(details(ean), vec![NewBatch::new(number, quantity, dates(10))])
    }

    fn ledger() -> InboundLedger<InMemoryDocumentStore> {
        InboundLedger::new(InMemoryDocumentStore::new())
    }

    #[tokio::test]
    async fn first_intake_creates_entry() {
        let ledger = ledger();
        let received = ledger.receive(intake("111", "B1", 100)).await.unwrap();

        assert!(received.created);
        assert_eq!(received.entry.batches.len(), 1);
        assert_eq!(received.entry.batches[0].quantity, 100);
    }

    #[tokio::test]
    async fn repeated_intake_is_duplicate() {
        let ledger = ledger();
        ledger.receive(intake("111", "B1", 100)).await.unwrap();

        let result = ledger.receive(intake("111", "B1", 100)).await;
        assert!(matches!(result, Err(InventoryError::Duplicate(_))));
        assert_eq!(ledger.history(&Ean::new("111")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_batch_appends_and_overwrites_metadata() {
        let ledger = ledger();
        ledger.receive(intake("111", "B1", 100)).await.unwrap();

        let renamed = Intake::new(
            ProductDetails::new("111", "Brown Rice", true),
            vec![NewBatch::new("B2", 5, dates(20))],
        );
        let received = ledger.receive(renamed).await.unwrap();

        assert!(!received.created);
        assert_eq!(received.entry.name, "Brown Rice");
        assert!(received.entry.perishable);
        assert_eq!(received.entry.batches.len(), 2);
    }

    #[tokio::test]
    async fn request_with_repeated_batch_number_is_rejected() {
        let ledger = ledger();
        let request = Intake::new(
            details("111"),
            vec![
                NewBatch::new("B1", 1, dates(10)),
                NewBatch::new("B1", 2, dates(12)),
            ],
        );
        assert!(matches!(
            ledger.receive(request).await,
            Err(InventoryError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn invalid_intake_is_rejected() {
        let ledger = ledger();
        let d = dates(10);
        let flipped = Intake::new(
            details("111"),
            vec![NewBatch::new(
                "B1",
                1,
                BatchDates::new(d.expiry_date, d.manufacturing_date),
            )],
        );
        assert!(matches!(
            ledger.receive(flipped).await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            ledger.receive(intake("", "B1", 1)).await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            ledger.receive(intake("11/1", "B1", 1)).await,
            Err(InventoryError::Validation(_))
        ));
        assert!(matches!(
            ledger.receive(Intake::new(details("111"), vec![])).await,
            Err(InventoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn missing_ean_is_not_found() {
        let ledger = ledger();
        assert!(matches!(
            ledger.find_by_ean(&Ean::new("999")).await,
            Err(InventoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_batch_fields_changes_one_line() {
        let ledger = ledger();
        let received = ledger.receive(intake("111", "B1", 100)).await.unwrap();
        let id = received.entry.batches[0].id;

        let update = BatchUpdate {
            quantity: Some(80),
            batch_number: Some("B1-A".to_string()),
            ..Default::default()
        };
        let entry = ledger
            .update_batch_fields(&Ean::new("111"), id, update)
            .await
            .unwrap();
        assert_eq!(entry.batches[0].quantity, 80);
        assert_eq!(entry.batches[0].batch_number, "B1-A");

        let missing = ledger
            .update_batch_fields(&Ean::new("111"), BatchId::new(), BatchUpdate::default())
            .await;
        assert!(matches!(missing, Err(InventoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn day_listings() {
        let ledger = ledger();
        ledger.receive(intake("111", "B1", 1)).await.unwrap();
        ledger.receive(intake("222", "B1", 1)).await.unwrap();

        let today = time::today();
        assert_eq!(ledger.list_for_day(today).await.unwrap().len(), 2);
        assert_eq!(
            ledger.list_batches_received_on(today).await.unwrap().len(),
            2
        );

        let yesterday = today.pred_opt().unwrap();
        assert!(ledger.list_for_day(yesterday).await.unwrap().is_empty());
        assert!(
            ledger
                .list_batches_received_on(yesterday)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn withdraw_and_restore_roundtrip() {
        let now = Utc::now();
        let mut entry = InboundEntry::new(&details("111"), now);
        entry
            .append_batches(vec![NewBatch::new("B1", 100, dates(10))], now)
            .unwrap();
        let original = entry.clone();
        let placement = Placement::in_zone("Z1");

        let partial = entry
            .withdraw("B1", 40, &placement, dates(10), now)
            .unwrap();
        assert!(!partial.removed);
        assert_eq!(entry.batches[0].quantity, 60);
        assert_eq!(entry.batches[0].placement.as_ref(), Some(&placement));

        entry.restore(&partial, now).unwrap();
        assert_eq!(entry.batches[0].quantity, 100);
        assert_eq!(entry.batches[0].id, original.batches[0].id);

        let full = entry
            .withdraw("B1", 100, &placement, dates(10), now)
            .unwrap();
        assert!(full.removed);
        assert!(entry.batches.is_empty());

        entry.restore(&full, now).unwrap();
        assert_eq!(entry.batches.len(), 1);
        assert_eq!(entry.batches[0].id, original.batches[0].id);
        assert_eq!(entry.batches[0].quantity, 100);
    }

    #[test]
    fn restore_keeps_a_later_placement_tag() {
        let now = Utc::now();
        let mut entry = InboundEntry::new(&details("111"), now);
        entry
            .append_batches(vec![NewBatch::new("B1", 100, dates(10))], now)
            .unwrap();
        let z1 = Placement::in_zone("Z1");
        let z2 = Placement::in_zone("Z2").aisle("A4");
        let later_dates = dates(40);

        let failed = entry.withdraw("B1", 10, &z1, dates(10), now).unwrap();
        entry.withdraw("B1", 20, &z2, later_dates, now).unwrap();
        entry.restore(&failed, now).unwrap();

        let batch = &entry.batches[0];
        assert_eq!(batch.quantity, 80);
        assert_eq!(batch.placement.as_ref(), Some(&z2));
        assert_eq!(batch.dates(), later_dates);
    }

    #[test]
    fn intake_total_refuses_to_overflow() {
        let now = Utc::now();
        let mut entry = InboundEntry::new(&details("111"), now);
        entry
            .append_batches(vec![NewBatch::new("B1", u64::MAX, dates(10))], now)
            .unwrap();

        let result = entry.append_batches(vec![NewBatch::new("B2", 1, dates(10))], now);
        assert!(matches!(result, Err(InventoryError::Validation(_))));
        assert_eq!(entry.batches.len(), 1);

        let mut line = entry.batches[0].clone();
        line.quantity = 1;
        let withdrawal = Withdrawal {
            before: line,
            position: 0,
            quantity: 1,
            removed: false,
        };
        assert!(matches!(
            entry.restore(&withdrawal, now),
            Err(InventoryError::Validation(_))
        ));
        assert_eq!(entry.total_quantity(), u64::MAX);
    }

    #[test]
    fn withdraw_checks_batch_and_quantity() {
        let now = Utc::now();
        let mut entry = InboundEntry::new(&details("111"), now);
        entry
            .append_batches(vec![NewBatch::new("B1", 10, dates(10))], now)
            .unwrap();
        let placement = Placement::in_zone("Z1");

        assert!(matches!(
            entry.withdraw("B9", 1, &placement, dates(10), now),
            Err(InventoryError::NotFound(_))
        ));
        assert!(matches!(
            entry.withdraw("B1", 11, &placement, dates(10), now),
            Err(InventoryError::InsufficientStock {
                requested: 11,
                available: 10
            })
        ));
        assert_eq!(entry.total_quantity(), 10);
    }
}
