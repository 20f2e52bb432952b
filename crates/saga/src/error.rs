//! Move error types.

use domain::InventoryError;
use thiserror::Error;

/// Errors that can occur while moving stock into storage.
#[derive(Debug, Error)]
pub enum MoveError {
    /// A step failed before anything was committed, or placement failed
    /// and the withdrawal was credited back.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Placement failed and crediting the withdrawal back failed too.
    /// The withdrawn quantity is neither in inbound nor placed.
    #[error("Internal error: placement failed ({placement}); restoring inbound stock failed ({compensation})")]
    CompensationFailed {
        placement: InventoryError,
        compensation: InventoryError,
    },
}

impl MoveError {
    /// Returns the inventory error behind this failure, if there is one.
    pub fn as_inventory(&self) -> Option<&InventoryError> {
        match self {
            MoveError::Inventory(err) => Some(err),
            MoveError::CompensationFailed { .. } => None,
        }
    }
}

impl From<document_store::DocumentStoreError> for MoveError {
    fn from(err: document_store::DocumentStoreError) -> Self {
        MoveError::Inventory(err.into())
    }
}

/// Convenience type alias for move results.
pub type Result<T> = std::result::Result<T, MoveError>;
