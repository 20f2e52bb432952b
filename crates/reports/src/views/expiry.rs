//! Freshness buckets over placed stock.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use common::Ean;
use document_store::DocumentStore;
use domain::time::{end_of_day, local_day};
use domain::{Batch, LocationEntry, LocationStore};
use serde::{Deserialize, Serialize};

use crate::report::Report;
use crate::{ReportError, Result};

const PERISHABLE_DAYS: u64 = 3;
const NEAR_MONTHS: u32 = 1;
const MID_MONTHS: u32 = 3;

/// Cut-offs of the three buckets, all relative to one evaluation instant.
///
/// Each cut-off is the last millisecond of a local day counted from today.
/// Month arithmetic clamps to the end of shorter months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryWindows {
    pub now: DateTime<Utc>,
    pub perishable_end: DateTime<Utc>,
    pub near_end: DateTime<Utc>,
    pub mid_end: DateTime<Utc>,
}

impl ExpiryWindows {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = local_day(now);
        Self {
            now,
            perishable_end: end_of_day(add_days(today, PERISHABLE_DAYS)),
            near_end: end_of_day(add_months(today, NEAR_MONTHS)),
            mid_end: end_of_day(add_months(today, MID_MONTHS)),
        }
    }

    /// `[now, perishable_end]`
    pub fn is_perishable_soon(&self, expiry: DateTime<Utc>) -> bool {
        expiry >= self.now && expiry <= self.perishable_end
    }

    /// `[now, near_end]`
    pub fn is_near(&self, expiry: DateTime<Utc>) -> bool {
        expiry >= self.now && expiry <= self.near_end
    }

    /// `(near_end, mid_end]`
    pub fn is_mid(&self, expiry: DateTime<Utc>) -> bool {
        expiry > self.near_end && expiry <= self.mid_end
    }
}

fn add_days(day: NaiveDate, days: u64) -> NaiveDate {
    day.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn add_months(day: NaiveDate, months: u32) -> NaiveDate {
    day.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Which identity keeps a product out of the mid bucket once it is near.
///
/// Grouping is always by ean and a near ean is never mid. Exclusion by
/// name also drops an unrelated product that happens to share a name,
/// which is logged when it happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKey {
    #[default]
    ProductName,
    Ean,
}

impl fmt::Display for ExclusionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionKey::ProductName => f.write_str("name"),
            ExclusionKey::Ean => f.write_str("ean"),
        }
    }
}

impl FromStr for ExclusionKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" | "product_name" => Ok(ExclusionKey::ProductName),
            "ean" => Ok(ExclusionKey::Ean),
            other => Err(ReportError::InvalidSetting(format!(
                "unknown expiry exclusion key: {other}"
            ))),
        }
    }
}

/// Matching batches of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpiryBucket {
    pub ean: Ean,
    pub name: String,
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryReport {
    /// Perishable products expiring within three days.
    pub perishable_soon: Vec<ExpiryBucket>,
    /// Non-perishable products expiring within a month.
    pub near: Vec<ExpiryBucket>,
    /// Non-perishable products expiring in one to three months, minus `near`.
    pub mid: Vec<ExpiryBucket>,
}

/// Groups the batches accepted by `window` per ean, keeping products with
/// at least one match. Ordered by name, then ean.
fn bucket<F>(entries: &[LocationEntry], perishable: bool, window: F) -> Vec<ExpiryBucket>
where
    F: Fn(DateTime<Utc>) -> bool,
{
    let mut grouped: BTreeMap<&Ean, ExpiryBucket> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.perishable == perishable) {
        let matching: Vec<_> = entry
            .batches
            .iter()
            .filter(|b| window(b.expiry_date))
            .cloned()
            .collect();
        if matching.is_empty() {
            continue;
        }
        grouped
            .entry(&entry.ean)
            .or_insert_with(|| ExpiryBucket {
                ean: entry.ean.clone(),
                name: entry.name.clone(),
                batches: Vec::new(),
            })
            .batches
            .extend(matching);
    }

    let mut buckets: Vec<_> = grouped.into_values().collect();
    buckets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.ean.cmp(&b.ean)));
    buckets
}

/// Classifies location entries into the three buckets.
pub fn classify_entries(
    entries: &[LocationEntry],
    windows: &ExpiryWindows,
    exclusion: ExclusionKey,
) -> ExpiryReport {
    let perishable_soon = bucket(entries, true, |expiry| windows.is_perishable_soon(expiry));
    let near = bucket(entries, false, |expiry| windows.is_near(expiry));
    let mid_candidates = bucket(entries, false, |expiry| windows.is_mid(expiry));

    let near_names: HashSet<&str> = near.iter().map(|b| b.name.as_str()).collect();
    let near_eans: HashSet<&Ean> = near.iter().map(|b| &b.ean).collect();

    let mid = mid_candidates
        .into_iter()
        .filter(|candidate| {
            let ean_is_near = near_eans.contains(&candidate.ean);
            match exclusion {
                ExclusionKey::Ean => !ean_is_near,
                ExclusionKey::ProductName => {
                    let name_is_near = near_names.contains(candidate.name.as_str());
                    if name_is_near && !ean_is_near {
                        tracing::warn!(
                            ean = %candidate.ean,
                            name = %candidate.name,
                            "excluded from mid expiry bucket only because another ean shares its name"
                        );
                    }
                    !(ean_is_near || name_is_near)
                }
            }
        })
        .collect();

    ExpiryReport {
        perishable_soon,
        near,
        mid,
    }
}

/// Distinct eans with any batch in any of the three windows.
pub fn count_expiring(entries: &[LocationEntry], windows: &ExpiryWindows) -> usize {
    entries
        .iter()
        .filter(|entry| {
            entry.batches.iter().any(|b| {
                if entry.perishable {
                    windows.is_perishable_soon(b.expiry_date)
                } else {
                    windows.is_near(b.expiry_date) || windows.is_mid(b.expiry_date)
                }
            })
        })
        .map(|entry| &entry.ean)
        .collect::<HashSet<_>>()
        .len()
}

/// Buckets placed stock by time to expiry.
pub struct ExpiryClassifier<S: DocumentStore> {
    locations: LocationStore<S>,
    exclusion: ExclusionKey,
}

impl<S: DocumentStore> ExpiryClassifier<S> {
    pub fn new(locations: LocationStore<S>) -> Self {
        Self {
            locations,
            exclusion: ExclusionKey::default(),
        }
    }

    pub fn with_exclusion(mut self, exclusion: ExclusionKey) -> Self {
        self.exclusion = exclusion;
        self
    }

    pub fn exclusion(&self) -> ExclusionKey {
        self.exclusion
    }

    #[tracing::instrument(skip(self), fields(exclusion = %self.exclusion))]
    pub async fn classify(&self, now: DateTime<Utc>) -> Result<ExpiryReport> {
        let entries = self.locations.all_entries().await?;
        let report = classify_entries(&entries, &ExpiryWindows::at(now), self.exclusion);
        tracing::debug!(
            perishable_soon = report.perishable_soon.len(),
            near = report.near.len(),
            mid = report.mid.len(),
            "expiry buckets computed"
        );
        Ok(report)
    }

    pub async fn perishable_soon(&self, now: DateTime<Utc>) -> Result<Vec<ExpiryBucket>> {
        Ok(self.classify(now).await?.perishable_soon)
    }

    pub async fn near(&self, now: DateTime<Utc>) -> Result<Vec<ExpiryBucket>> {
        Ok(self.classify(now).await?.near)
    }

    pub async fn mid(&self, now: DateTime<Utc>) -> Result<Vec<ExpiryBucket>> {
        Ok(self.classify(now).await?.mid)
    }

    /// Number of distinct products expiring in any bucket.
    #[tracing::instrument(skip(self))]
    pub async fn total_expiring_count(&self, now: DateTime<Utc>) -> Result<usize> {
        let entries = self.locations.all_entries().await?;
        Ok(count_expiring(&entries, &ExpiryWindows::at(now)))
    }
}

#[async_trait]
impl<S: DocumentStore> Report for ExpiryClassifier<S> {
    type Output = ExpiryReport;

    fn name(&self) -> &'static str {
        "expiry"
    }

    async fn generate(&self, now: DateTime<Utc>) -> Result<ExpiryReport> {
        self.classify(now).await
    }
}
