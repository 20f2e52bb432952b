//! Report error types.

use domain::InventoryError;
use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Reading the underlying inventory failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// A report setting is out of range.
    #[error("Invalid report setting: {0}")]
    InvalidSetting(String),
}

impl From<document_store::DocumentStoreError> for ReportError {
    fn from(err: document_store::DocumentStoreError) -> Self {
        ReportError::Inventory(err.into())
    }
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
