//! Placed stock, grouped per `(ean, name, perishable)`.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use common::{Ean, Placement};
use document_store::DocumentStore;
use serde::{Deserialize, Serialize};

use crate::batch::{self, Batch, BatchDates, add_quantity};
use crate::entity::Entity;
use crate::error::{InventoryError, Result};
use crate::inbound::validate_ean;
use crate::repository::{Repository, Stored};
use crate::stock::{StockPage, StockQuery, StockSummary};
use crate::time::DateRange;

/// Identity of a location entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub ean: Ean,
    pub name: String,
    pub perishable: bool,
}

impl LocationKey {
    pub fn new(ean: impl Into<Ean>, name: impl Into<String>, perishable: bool) -> Self {
        Self {
            ean: ean.into(),
            name: name.into(),
            perishable,
        }
    }

    /// Document key. Entries of one ean share the `"{ean}/"` prefix.
    pub fn document_key(&self) -> String {
        format!("{}{}/{}", Self::prefix(&self.ean), self.perishable, self.name)
    }

    pub fn prefix(ean: &Ean) -> String {
        format!("{ean}/")
    }
}

/// Placed batches of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationEntry {
    pub ean: Ean,
    pub name: String,
    pub perishable: bool,
    pub batches: Vec<Batch>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for LocationEntry {
    const COLLECTION: &'static str = "locations";

    fn key(&self) -> String {
        self.location_key().document_key()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl LocationEntry {
    pub fn new(key: &LocationKey, now: DateTime<Utc>) -> Self {
        Self {
            ean: key.ean.clone(),
            name: key.name.clone(),
            perishable: key.perishable,
            batches: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn location_key(&self) -> LocationKey {
        LocationKey::new(self.ean.clone(), self.name.clone(), self.perishable)
    }

    pub fn stock(&self) -> u64 {
        batch::total(self.batches.iter().map(|b| b.quantity))
    }

    /// Adds quantity to the batch with this number at exactly this placement,
    /// or appends a new line when there is none.
    ///
    /// Fails without changing the entry when its total would overflow.
    pub fn upsert_placement(
        &mut self,
        batch_number: &str,
        quantity: u64,
        dates: BatchDates,
        placement: &Placement,
        now: DateTime<Utc>,
    ) -> Result<&Batch> {
        add_quantity(self.stock(), quantity)?;
        self.updated_at = now;
        let position = self
            .batches
            .iter()
            .position(|b| b.batch_number == batch_number && b.is_at(placement));
        let position = match position {
            Some(position) => {
                let batch = &mut self.batches[position];
                batch.quantity = add_quantity(batch.quantity, quantity)?;
                batch.set_dates(dates);
                batch.updated_at = now;
                position
            }
            None => {
                self.batches.push(Batch::placed(
                    batch_number,
                    quantity,
                    dates,
                    placement.clone(),
                    now,
                ));
                self.batches.len() - 1
            }
        };
        Ok(&self.batches[position])
    }

    /// Reduces every matching batch, clamping at zero. Returns the reduced lines.
    pub fn reduce(&mut self, reduction: &Reduction, now: DateTime<Utc>) -> Vec<Batch> {
        let mut reduced = Vec::new();
        for batch in self.batches.iter_mut().filter(|b| reduction.matches(b)) {
            batch.quantity = batch.quantity.saturating_sub(reduction.amount);
            batch.updated_at = now;
            reduced.push(batch.clone());
        }
        if !reduced.is_empty() {
            self.updated_at = now;
        }
        reduced
    }

    /// Index of the first batch in a zone.
    pub fn first_in_zone(&self, zone: &str) -> Option<usize> {
        self.batches.iter().position(|b| b.zone() == Some(zone))
    }

    /// Moves quantity from the first batch in the source zone to the batch of
    /// the same number in the destination zone, creating it when absent.
    pub fn transfer(&mut self, transfer: &Transfer, now: DateTime<Utc>) -> Result<()> {
        let source = self.first_in_zone(&transfer.from_zone).ok_or_else(|| {
            InventoryError::not_found(format!("no batch found in {}", transfer.from_zone))
        })?;

        let available = self.batches[source].quantity;
        if available < transfer.quantity {
            return Err(InventoryError::InsufficientStock {
                requested: transfer.quantity,
                available,
            });
        }

        let batch_number = self.batches[source].batch_number.clone();
        let destination = self.batches.iter().position(|b| {
            b.batch_number == batch_number && b.zone() == Some(transfer.to_zone.as_str())
        });
        let destination = match destination {
            Some(destination) => destination,
            None => {
                let from = &self.batches[source];
                let placement = from
                    .placement
                    .as_ref()
                    .map(|p| p.with_zone(transfer.to_zone.as_str()))
                    .unwrap_or_else(|| Placement::in_zone(transfer.to_zone.as_str()));
                let line = Batch::placed(batch_number, 0, from.dates(), placement, now);
                self.batches.push(line);
                self.batches.len() - 1
            }
        };

        let received = add_quantity(self.batches[destination].quantity, transfer.quantity)?;
        self.batches[source].quantity -= transfer.quantity;
        self.batches[source].updated_at = now;
        self.batches[destination].quantity = received;
        self.batches[destination].updated_at = now;
        self.updated_at = now;
        Ok(())
    }
}

/// In-place consumption of stock at one placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reduction {
    pub placement: Placement,
    pub amount: u64,
    /// Narrows the match to one batch number.
    #[serde(default)]
    pub batch_number: Option<String>,
}

impl Reduction {
    pub fn new(placement: Placement, amount: u64) -> Self {
        Self {
            placement,
            amount,
            batch_number: None,
        }
    }

    pub fn batch_number(mut self, number: impl Into<String>) -> Self {
        self.batch_number = Some(number.into());
        self
    }

    pub fn matches(&self, batch: &Batch) -> bool {
        batch.is_at(&self.placement)
            && self
                .batch_number
                .as_deref()
                .is_none_or(|number| batch.batch_number == number)
    }
}

/// Zone-to-zone movement of placed stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub from_zone: String,
    pub to_zone: String,
    pub quantity: u64,
}

impl Transfer {
    pub fn new(from_zone: impl Into<String>, to_zone: impl Into<String>, quantity: u64) -> Self {
        Self {
            from_zone: from_zone.into(),
            to_zone: to_zone.into(),
            quantity,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.from_zone.trim().is_empty() || self.to_zone.trim().is_empty() {
            return Err(InventoryError::validation("fromZone and toZone are required"));
        }
        if self.quantity == 0 {
            return Err(InventoryError::validation("quantity must be greater than zero"));
        }
        if self.from_zone == self.to_zone {
            return Err(InventoryError::validation(
                "fromZone and toZone must differ",
            ));
        }
        Ok(())
    }
}

/// All placed batches of one ean, across its entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationView {
    pub ean: Ean,
    pub name: String,
    pub batches: Vec<Batch>,
}

/// Holds placed stock and answers stock questions about it.
pub struct LocationStore<S: DocumentStore> {
    entries: Repository<S, LocationEntry>,
}

impl<S: DocumentStore + Clone> Clone for LocationStore<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<S: DocumentStore> LocationStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            entries: Repository::new(store),
        }
    }

    /// Adds stock at a placement. The only operation that increases placed stock.
    #[tracing::instrument(skip(self, key, dates, placement), fields(ean = %key.ean, %placement))]
    pub async fn upsert_placement(
        &self,
        key: &LocationKey,
        batch_number: &str,
        quantity: u64,
        dates: BatchDates,
        placement: &Placement,
    ) -> Result<LocationEntry> {
        validate_ean(&key.ean)?;
        let now = Utc::now();
        let stored = self
            .entries
            .update(&key.document_key(), |existing| {
                let mut entry = existing.unwrap_or_else(|| LocationEntry::new(key, now));
                entry.upsert_placement(batch_number, quantity, dates, placement, now)?;
                Ok(entry)
            })
            .await?;
        tracing::debug!(version = %stored.version, "placement upserted");
        Ok(stored.entity)
    }

    /// Consumes stock in place at a placement, never below zero.
    ///
    /// Every batch at the placement absorbs the full amount unless the
    /// reduction names a batch number.
    #[tracing::instrument(skip(self), fields(placement = %reduction.placement))]
    pub async fn reduce(&self, ean: &Ean, reduction: Reduction) -> Result<Vec<Batch>> {
        if reduction.amount == 0 {
            return Err(InventoryError::validation(
                "reduction amount must be greater than zero",
            ));
        }
        let now = Utc::now();
        let mut reduced = Vec::new();
        for mut stored in self.load_all(ean).await? {
            let lines = stored.entity.reduce(&reduction, now);
            if lines.is_empty() {
                continue;
            }
            self.entries.save(stored).await?;
            reduced.extend(lines);
        }

        if reduced.is_empty() {
            return Err(InventoryError::not_found(format!(
                "no batches for ean {ean} at {}",
                reduction.placement
            )));
        }

        let distinct: HashSet<_> = reduced.iter().map(|b| b.id).collect();
        if distinct.len() > 1 {
            tracing::warn!(
                batches = distinct.len(),
                amount = reduction.amount,
                "reduction applied to every batch sharing the placement"
            );
        }
        metrics::counter!("stock_reductions_total").increment(1);
        tracing::info!(batches = reduced.len(), "stock reduced");
        Ok(reduced)
    }

    /// Moves stock between zones of one ean, conserving its total.
    #[tracing::instrument(skip(self))]
    pub async fn transfer(&self, ean: &Ean, transfer: Transfer) -> Result<LocationEntry> {
        transfer.validate()?;
        let entries = self.load_all(ean).await?;
        let mut source = entries
            .into_iter()
            .find(|stored| stored.entity.first_in_zone(&transfer.from_zone).is_some())
            .ok_or_else(|| {
                InventoryError::not_found(format!(
                    "no batch found in {} for ean {ean}",
                    transfer.from_zone
                ))
            })?;

        source.entity.transfer(&transfer, Utc::now())?;
        let stored = self.entries.save(source).await?;

        metrics::counter!("transfers_total").increment(1);
        tracing::info!(quantity = transfer.quantity, "stock transferred");
        Ok(stored.entity)
    }

    /// Total placed quantity of an ean across every entry and placement.
    pub async fn stock_for(&self, ean: &Ean) -> Result<u64> {
        Ok(batch::total(
            self.load_all(ean)
                .await?
                .iter()
                .map(|stored| stored.entity.stock()),
        ))
    }

    /// All placed batches of an ean.
    pub async fn find_by_ean(&self, ean: &Ean) -> Result<LocationView> {
        let entries = self.load_all(ean).await?;
        let Some(first) = entries.first() else {
            return Err(InventoryError::not_found(format!(
                "no location found for ean {ean}"
            )));
        };
        let name = first.entity.name.clone();
        Ok(LocationView {
            ean: ean.clone(),
            name,
            batches: entries
                .into_iter()
                .flat_map(|stored| stored.entity.batches)
                .collect(),
        })
    }

    /// Entries holding a batch placed on the given local day, or every entry.
    pub async fn list(&self, day: Option<NaiveDate>) -> Result<Vec<LocationEntry>> {
        let entries = self.entries.scan().await?;
        Ok(match day {
            Some(day) => {
                let range = DateRange::day(day);
                entries
                    .into_iter()
                    .filter(|entry| entry.batches.iter().any(|b| range.contains(b.created_at)))
                    .collect()
            }
            None => entries,
        })
    }

    /// Entries whose ean equals `term` or whose name contains it, ignoring case.
    pub async fn search(&self, term: &str) -> Result<Vec<LocationEntry>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(InventoryError::validation("query parameter is required"));
        }
        let needle = term.to_lowercase();
        Ok(self
            .entries
            .scan()
            .await?
            .into_iter()
            .filter(|entry| {
                entry.ean.as_str() == term || entry.name.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Stock totals per ean, filtered, sorted by name and paged.
    #[tracing::instrument(skip(self))]
    pub async fn aggregate_all_zones_paginated(&self, query: StockQuery) -> Result<StockPage> {
        let mut totals: BTreeMap<Ean, StockSummary> = BTreeMap::new();
        for entry in self.entries.scan().await? {
            if !query.matches(&entry.ean, &entry.name) {
                continue;
            }
            let stock = entry.stock();
            let summary = totals
                .entry(entry.ean.clone())
                .or_insert_with(|| StockSummary {
                    ean: entry.ean.clone(),
                    name: entry.name.clone(),
                    quantity: 0,
                });
            summary.quantity = summary.quantity.saturating_add(stock);
        }

        let mut data: Vec<_> = totals.into_values().collect();
        data.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.ean.cmp(&b.ean)));
        let total = data.len();
        let data = data
            .into_iter()
            .skip(query.offset())
            .take(query.page_size())
            .collect();

        Ok(StockPage {
            total,
            page: query.page_number(),
            limit: query.page_size(),
            data,
        })
    }

    /// True when a placed batch has this number and these exact dates.
    pub async fn has_identical_batch(
        &self,
        ean: &Ean,
        batch_number: &str,
        dates: &BatchDates,
    ) -> Result<bool> {
        Ok(self.load_all(ean).await?.iter().any(|stored| {
            stored
                .entity
                .batches
                .iter()
                .any(|b| b.is_same_lot(batch_number, dates))
        }))
    }

    /// Every location entry.
    pub async fn all_entries(&self) -> Result<Vec<LocationEntry>> {
        self.entries.scan().await
    }

    async fn load_all(&self, ean: &Ean) -> Result<Vec<Stored<LocationEntry>>> {
        self.entries.load_prefix(&LocationKey::prefix(ean)).await
    }
}
