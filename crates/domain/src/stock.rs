//! Paginated stock totals across every zone.

use common::Ean;
use serde::{Deserialize, Serialize};

/// Filter and paging for the all-zones stock listing.
///
/// Built explicitly rather than by conditionally mutating a query object;
/// page and limit are clamped to at least one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockQuery {
    page: usize,
    limit: usize,
    search: Option<String>,
}

impl Default for StockQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
        }
    }
}

impl StockQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Case-insensitive substring filter on ean or name. Blank means no filter.
    pub fn search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.limit
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn matches(&self, ean: &Ean, name: &str) -> bool {
        match self.search {
            Some(ref term) => {
                ean.as_str().to_lowercase().contains(term.as_str())
                    || name.to_lowercase().contains(term.as_str())
            }
            None => true,
        }
    }
}

/// Total placed quantity of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub ean: Ean,
    pub name: String,
    pub quantity: u64,
}

/// One page of stock totals plus the number of matching products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockPage {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub data: Vec<StockSummary>,
}
