//! Batch records shared by the inbound ledger and the location store.

use chrono::{DateTime, Utc};
use common::{BatchId, Placement};
use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};
use crate::time::flexible;

/// Adds to a stored quantity, failing instead of wrapping.
pub fn add_quantity(current: u64, added: u64) -> Result<u64> {
    current.checked_add(added).ok_or_else(|| {
        InventoryError::validation(format!(
            "adding {added} to {current} exceeds the largest storable quantity"
        ))
    })
}

/// Sums quantities that are already bounded by a checked total.
pub(crate) fn total<I: IntoIterator<Item = u64>>(quantities: I) -> u64 {
    quantities.into_iter().fold(0, u64::saturating_add)
}

/// A quantity of one product received together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: BatchId,
    pub batch_number: String,
    pub quantity: u64,
    pub manufacturing_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// Creates a batch line from intake data. Missing quantity means zero.
    pub fn received(new: NewBatch, now: DateTime<Utc>) -> Self {
        Self {
            id: BatchId::new(),
            batch_number: new.batch_number.trim().to_string(),
            quantity: new.quantity.unwrap_or(0),
            manufacturing_date: new.manufacturing_date,
            expiry_date: new.expiry_date,
            limit: new.limit,
            placement: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a placed batch line.
    pub fn placed(
        batch_number: impl Into<String>,
        quantity: u64,
        dates: BatchDates,
        placement: Placement,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BatchId::new(),
            batch_number: batch_number.into(),
            quantity,
            manufacturing_date: dates.manufacturing_date,
            expiry_date: dates.expiry_date,
            limit: None,
            placement: Some(placement),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn dates(&self) -> BatchDates {
        BatchDates {
            manufacturing_date: self.manufacturing_date,
            expiry_date: self.expiry_date,
        }
    }

    pub fn set_dates(&mut self, dates: BatchDates) {
        self.manufacturing_date = dates.manufacturing_date;
        self.expiry_date = dates.expiry_date;
    }

    /// True when batch number and both dates are identical.
    pub fn is_same_lot(&self, batch_number: &str, dates: &BatchDates) -> bool {
        self.batch_number == batch_number && self.dates() == *dates
    }

    pub fn is_at(&self, placement: &Placement) -> bool {
        self.placement.as_ref() == Some(placement)
    }

    pub fn zone(&self) -> Option<&str> {
        self.placement.as_ref().map(|p| p.zone.as_str())
    }
}

/// Manufacturing and expiry dates of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDates {
    #[serde(deserialize_with = "flexible::deserialize")]
    pub manufacturing_date: DateTime<Utc>,
    #[serde(deserialize_with = "flexible::deserialize")]
    pub expiry_date: DateTime<Utc>,
}

impl BatchDates {
    pub fn new(manufacturing_date: DateTime<Utc>, expiry_date: DateTime<Utc>) -> Self {
        Self {
            manufacturing_date,
            expiry_date,
        }
    }

    /// Rejects dates where expiry is not strictly after manufacturing.
    pub fn validate(&self) -> Result<()> {
        if self.expiry_date <= self.manufacturing_date {
            return Err(InventoryError::validation(format!(
                "expiry date {} must be after manufacturing date {}",
                self.expiry_date, self.manufacturing_date
            )));
        }
        Ok(())
    }
}

/// Intake data for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub batch_number: String,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(deserialize_with = "flexible::deserialize")]
    pub manufacturing_date: DateTime<Utc>,
    #[serde(deserialize_with = "flexible::deserialize")]
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl NewBatch {
    pub fn new(batch_number: impl Into<String>, quantity: u64, dates: BatchDates) -> Self {
        Self {
            batch_number: batch_number.into(),
            quantity: Some(quantity),
            manufacturing_date: dates.manufacturing_date,
            expiry_date: dates.expiry_date,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn dates(&self) -> BatchDates {
        BatchDates::new(self.manufacturing_date, self.expiry_date)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_number.trim().is_empty() {
            return Err(InventoryError::validation("batch number is required"));
        }
        self.dates().validate()
    }
}

/// Partial update of a batch line. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdate {
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default, deserialize_with = "flexible::option::deserialize")]
    pub manufacturing_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible::option::deserialize")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl BatchUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the update, validating the resulting batch before committing.
    pub fn apply_to(&self, batch: &mut Batch, now: DateTime<Utc>) -> Result<()> {
        let mut updated = batch.clone();
        if let Some(ref number) = self.batch_number {
            let number = number.trim();
            if number.is_empty() {
                return Err(InventoryError::validation("batch number must not be empty"));
            }
            updated.batch_number = number.to_string();
        }
        if let Some(quantity) = self.quantity {
            updated.quantity = quantity;
        }
        if let Some(date) = self.manufacturing_date {
            updated.manufacturing_date = date;
        }
        if let Some(date) = self.expiry_date {
            updated.expiry_date = date;
        }
        if let Some(limit) = self.limit {
            updated.limit = Some(limit);
        }
        updated.dates().validate()?;
        updated.updated_at = now;
        *batch = updated;
        Ok(())
    }
}
