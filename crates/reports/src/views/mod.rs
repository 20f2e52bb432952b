//! Report implementations.

pub mod expiry;
pub mod inbound_summary;
pub mod low_stock;

pub use expiry::{ExclusionKey, ExpiryBucket, ExpiryClassifier, ExpiryReport, ExpiryWindows};
pub use inbound_summary::InboundSummary;
pub use low_stock::{LowStockDetector, LowStockItem, Threshold};
