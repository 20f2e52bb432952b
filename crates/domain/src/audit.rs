//! Append-only trail of completed moves.

use chrono::{DateTime, Utc};
use common::{Ean, Placement};
use document_store::{DocumentQuery, DocumentStore};
use serde::{Deserialize, Serialize};

use crate::batch::BatchDates;
use crate::entity::Entity;
use crate::error::Result;
use crate::location::LocationKey;
use crate::repository::{Repository, Stored};
use crate::time::{self, DateRange};

/// One move into storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMove {
    pub batch_number: String,
    pub quantity: u64,
    pub placement: Placement,
    pub manufacturing_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub moved_at: DateTime<Utc>,
}

impl RecordedMove {
    pub fn new(
        batch_number: impl Into<String>,
        quantity: u64,
        placement: Placement,
        dates: BatchDates,
        moved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_number: batch_number.into(),
            quantity,
            placement,
            manufacturing_date: dates.manufacturing_date,
            expiry_date: dates.expiry_date,
            moved_at,
        }
    }
}

/// Where the batches of one product have been placed. Never shrinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRecord {
    pub ean: Ean,
    pub name: String,
    pub perishable: bool,
    pub batches: Vec<RecordedMove>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for InboundRecord {
    const COLLECTION: &'static str = "inbound_records";

    fn key(&self) -> String {
        LocationKey::new(self.ean.clone(), self.name.clone(), self.perishable).document_key()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Record counts since the start of today, of the last 7 days and of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub daily: usize,
    pub weekly: usize,
    pub monthly: usize,
}

pub struct InboundRecordLog<S: DocumentStore> {
    records: Repository<S, InboundRecord>,
}

impl<S: DocumentStore + Clone> Clone for InboundRecordLog<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<S: DocumentStore> InboundRecordLog<S> {
    pub fn new(store: S) -> Self {
        Self {
            records: Repository::new(store),
        }
    }

    /// Appends a move, creating the product's record on its first move.
    #[tracing::instrument(skip(self, key, entry), fields(ean = %key.ean, batch = %entry.batch_number))]
    pub async fn append(&self, key: &LocationKey, entry: RecordedMove) -> Result<InboundRecord> {
        let now = entry.moved_at;
        let stored = self
            .records
            .update(&key.document_key(), |existing| {
                let mut record = existing.unwrap_or_else(|| InboundRecord {
                    ean: key.ean.clone(),
                    name: key.name.clone(),
                    perishable: key.perishable,
                    batches: Vec::new(),
                    created_at: now,
                    updated_at: now,
                });
                record.batches.push(entry);
                record.updated_at = now;
                Ok(record)
            })
            .await?;
        Ok(stored.entity)
    }

    /// Records created within the range, or all records.
    pub async fn list(&self, range: Option<DateRange>) -> Result<Vec<InboundRecord>> {
        let query = match range {
            Some(range) => DocumentQuery::default().created_between(range.start, range.end),
            None => DocumentQuery::default(),
        };
        Ok(self
            .records
            .query(query)
            .await?
            .into_iter()
            .map(Stored::into_inner)
            .collect())
    }

    /// Counts records created since local midnight, since six days before
    /// today and since the first of the current month.
    pub async fn summary(&self, now: DateTime<Utc>) -> Result<RecordSummary> {
        let today = time::local_day(now);
        let week_start = today - chrono::Days::new(6);
        let month_start = time::first_of_month(today);

        Ok(RecordSummary {
            daily: self.count_since(time::start_of_day(today)).await?,
            weekly: self.count_since(time::start_of_day(week_start)).await?,
            monthly: self.count_since(time::start_of_day(month_start)).await?,
        })
    }

    async fn count_since(&self, from: DateTime<Utc>) -> Result<usize> {
        Ok(self
            .records
            .query(DocumentQuery::default().created_from(from))
            .await?
            .len())
    }
}
