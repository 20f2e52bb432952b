//! Domain error types.

use document_store::DocumentStoreError;
use thiserror::Error;

/// Errors that can occur during inventory operations.
///
/// Every error is scoped to the operation that produced it; none is fatal
/// to the process and none is retried inside the domain.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Malformed or missing required input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A batch (or other keyed value) with the same identity already exists.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// The referenced ean, batch or placement does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested quantity exceeds what is available.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u64, available: u64 },

    /// Another writer changed the same entity between our read and write.
    #[error("Concurrent modification of {entity}; retry the request")]
    Conflict { entity: String },

    /// Unexpected failure in the persistence collaborator.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InventoryError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }
}

impl From<DocumentStoreError> for InventoryError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::ConcurrencyConflict {
                collection, key, ..
            } => InventoryError::Conflict {
                entity: format!("{collection}/{key}"),
            },
            DocumentStoreError::InvalidKey(msg) => InventoryError::Validation(msg),
            other => InventoryError::Internal(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Internal(format!("corrupt document: {err}"))
    }
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, InventoryError>;
