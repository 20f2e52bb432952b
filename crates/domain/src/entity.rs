//! Persisted entity trait.

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

/// A document-backed entity.
///
/// Each entity is stored as one document and is the unit of atomicity:
/// a mutation loads it, changes it in memory and writes it back guarded by
/// the version it was read at.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the entity's documents live in.
    const COLLECTION: &'static str;

    /// Key of the entity's document, unique within the collection.
    fn key(&self) -> String;

    /// When the entity was first created. Drives day-window queries.
    fn created_at(&self) -> DateTime<Utc>;
}
