//! Read-side reports over current inventory.
//!
//! - [`ExpiryClassifier`] buckets placed stock by time to expiry
//! - [`LowStockDetector`] flags products near empty relative to capacity
//! - [`InboundSummary`] counts recent moves into storage
//!
//! Reports are computed on demand through the [`Report`] trait.

pub mod error;
pub mod report;
pub mod views;

pub use error::{ReportError, Result};
pub use report::{Report, run};
pub use views::{
    ExclusionKey, ExpiryBucket, ExpiryClassifier, ExpiryReport, ExpiryWindows, InboundSummary,
    LowStockDetector, LowStockItem, Threshold,
};
