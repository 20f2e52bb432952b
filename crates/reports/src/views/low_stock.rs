//! Products whose placed stock fell to a fraction of their capacity.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Ean;
use document_store::DocumentStore;
use domain::{LocationStore, ProductCatalog};
use serde::{Deserialize, Serialize};

use crate::report::Report;
use crate::{ReportError, Result};

const SCALE: u64 = 10_000;

/// Low-stock threshold as an exact fraction of capacity.
///
/// Stored in ten-thousandths so `current <= fraction * limit` is decided in
/// integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    parts: u64,
}

impl Threshold {
    pub fn from_fraction(fraction: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ReportError::InvalidSetting(format!(
                "low-stock fraction must be within 0..=1, got {fraction}"
            )));
        }
        Ok(Self {
            parts: (fraction * SCALE as f64).round() as u64,
        })
    }

    pub fn fraction(&self) -> f64 {
        self.parts as f64 / SCALE as f64
    }

    pub fn is_low(&self, current: u64, limit: u64) -> bool {
        u128::from(current) * u128::from(SCALE) <= u128::from(limit) * u128::from(self.parts)
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self { parts: 2_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockItem {
    pub product_name: String,
    pub ean: Ean,
    pub current_stock: u64,
    pub limit_quantity: u64,
}

/// Flags products at or below the threshold, most depleted first.
///
/// Products without any placed batch are skipped rather than reported as
/// empty.
pub struct LowStockDetector<S: DocumentStore> {
    catalog: ProductCatalog<S>,
    locations: LocationStore<S>,
    threshold: Threshold,
}

impl<S: DocumentStore> LowStockDetector<S> {
    pub fn new(catalog: ProductCatalog<S>, locations: LocationStore<S>) -> Self {
        Self {
            catalog,
            locations,
            threshold: Threshold::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    #[tracing::instrument(skip(self), fields(fraction = self.threshold.fraction()))]
    pub async fn detect(&self) -> Result<Vec<LowStockItem>> {
        let (products, entries) =
            futures_util::try_join!(self.catalog.list(), self.locations.all_entries())?;

        // ean -> (placed batch count, current stock)
        let mut placed: HashMap<&Ean, (usize, u64)> = HashMap::new();
        for entry in &entries {
            let totals = placed.entry(&entry.ean).or_default();
            totals.0 += entry.batches.len();
            totals.1 = totals.1.saturating_add(entry.stock());
        }

        let mut low: Vec<_> = products
            .into_iter()
            .filter_map(|product| {
                let (batches, current_stock) = placed.get(&product.ean).copied()?;
                if batches == 0 {
                    return None;
                }
                let limit_quantity = product.limit_quantity();
                self.threshold
                    .is_low(current_stock, limit_quantity)
                    .then(|| LowStockItem {
                        product_name: product.product_name,
                        ean: product.ean,
                        current_stock,
                        limit_quantity,
                    })
            })
            .collect();

        low.sort_by_key(|item| item.current_stock);
        tracing::debug!(flagged = low.len(), "low-stock scan complete");
        Ok(low)
    }
}

#[async_trait]
impl<S: DocumentStore> Report for LowStockDetector<S> {
    type Output = Vec<LowStockItem>;

    fn name(&self) -> &'static str {
        "low_stock"
    }

    async fn generate(&self, _now: DateTime<Utc>) -> Result<Vec<LowStockItem>> {
        self.detect().await
    }
}
