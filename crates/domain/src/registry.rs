//! Named storage values per category (zones, aisles, bays and so on).
//!
//! Each category is its own document so edits to one category never
//! contend with edits to another.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use document_store::DocumentStore;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{InventoryError, Result};
use crate::repository::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageCategory {
    Zone,
    Aisle,
    Bay,
    Shelf,
    Bin,
    Pallet,
    BulkStorage,
}

impl StorageCategory {
    pub const ALL: [StorageCategory; 7] = [
        StorageCategory::Zone,
        StorageCategory::Aisle,
        StorageCategory::Bay,
        StorageCategory::Shelf,
        StorageCategory::Bin,
        StorageCategory::Pallet,
        StorageCategory::BulkStorage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageCategory::Zone => "zone",
            StorageCategory::Aisle => "aisle",
            StorageCategory::Bay => "bay",
            StorageCategory::Shelf => "shelf",
            StorageCategory::Bin => "bin",
            StorageCategory::Pallet => "pallet",
            StorageCategory::BulkStorage => "bulk_storage",
        }
    }
}

impl fmt::Display for StorageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageCategory {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| InventoryError::validation(format!("unknown storage category: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntries {
    pub category: StorageCategory,
    pub names: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for CategoryEntries {
    const COLLECTION: &'static str = "storage_registry";

    fn key(&self) -> String {
        self.category.to_string()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn normalize(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(InventoryError::validation("name must not be empty"));
    }
    Ok(name.to_string())
}

pub struct StorageRegistry<S: DocumentStore> {
    categories: Repository<S, CategoryEntries>,
}

impl<S: DocumentStore + Clone> Clone for StorageRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            categories: self.categories.clone(),
        }
    }
}

impl<S: DocumentStore> StorageRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            categories: Repository::new(store),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn add(&self, category: StorageCategory, name: &str) -> Result<Vec<String>> {
        let name = normalize(name)?;
        let stored = self
            .categories
            .update(category.as_str(), |existing| {
                let mut entries = existing.unwrap_or_else(|| CategoryEntries {
                    category,
                    names: Vec::new(),
                    created_at: Utc::now(),
                });
                if entries.names.contains(&name) {
                    return Err(InventoryError::duplicate(format!(
                        "{category} {name} already exists"
                    )));
                }
                entries.names.push(name.clone());
                Ok(entries)
            })
            .await?;
        tracing::info!("storage entry added");
        Ok(stored.entity.names)
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename(
        &self,
        category: StorageCategory,
        old: &str,
        new: &str,
    ) -> Result<Vec<String>> {
        let old = normalize(old)?;
        let new = normalize(new)?;
        let stored = self
            .categories
            .update(category.as_str(), |existing| {
                let mut entries = existing.ok_or_else(|| {
                    InventoryError::not_found(format!("{category} {old} not found"))
                })?;
                if old != new && entries.names.contains(&new) {
                    return Err(InventoryError::duplicate(format!(
                        "{category} {new} already exists"
                    )));
                }
                let slot = entries
                    .names
                    .iter_mut()
                    .find(|n| **n == old)
                    .ok_or_else(|| InventoryError::not_found(format!("{category} {old} not found")))?;
                *slot = new.clone();
                Ok(entries)
            })
            .await?;
        tracing::info!("storage entry renamed");
        Ok(stored.entity.names)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, category: StorageCategory, name: &str) -> Result<Vec<String>> {
        let name = name.trim().to_string();
        let stored = self
            .categories
            .update(category.as_str(), |existing| {
                let mut entries = existing.ok_or_else(|| {
                    InventoryError::not_found(format!("{category} {name} not found"))
                })?;
                let before = entries.names.len();
                entries.names.retain(|n| *n != name);
                if entries.names.len() == before {
                    return Err(InventoryError::not_found(format!(
                        "{category} {name} not found"
                    )));
                }
                Ok(entries)
            })
            .await?;
        tracing::info!("storage entry removed");
        Ok(stored.entity.names)
    }

    pub async fn list(&self, category: StorageCategory) -> Result<Vec<String>> {
        Ok(self
            .categories
            .load(category.as_str())
            .await?
            .map(|stored| stored.entity.names)
            .unwrap_or_default())
    }

    /// Every category with its names; empty categories included.
    pub async fn snapshot(&self) -> Result<BTreeMap<StorageCategory, Vec<String>>> {
        let mut snapshot: BTreeMap<_, _> = StorageCategory::ALL
            .into_iter()
            .map(|category| (category, Vec::new()))
            .collect();
        for entries in self.categories.scan().await? {
            snapshot.insert(entries.category, entries.names);
        }
        Ok(snapshot)
    }
}
