//! HTTP route handlers.

pub mod health;
pub mod inbound;
pub mod locations;
pub mod metrics;
pub mod moves;
pub mod products;
pub mod records;
pub mod registry;
pub mod reports;

use serde::Deserialize;

/// `?date=YYYY-MM-DD` filter shared by day listings.
#[derive(Debug, Default, Deserialize)]
pub struct DateFilter {
    pub date: Option<String>,
}
