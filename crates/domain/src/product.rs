//! Product catalog: metadata and configured capacity per ean.

use chrono::{DateTime, Utc};
use common::Ean;
use document_store::DocumentStore;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{InventoryError, Result};
use crate::inbound::validate_ean;
use crate::repository::{Repository, Stored};

/// A configured storage slot for a product and its capacity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductSlot {
    pub zone: Option<String>,
    pub aisle: Option<String>,
    pub bay: Option<String>,
    pub shelf: Option<String>,
    pub bin: Option<String>,
    pub pallets: Option<String>,
    pub bulk_storage: Option<String>,
    pub quantity: u64,
}

impl ProductSlot {
    pub fn in_zone(zone: impl Into<String>, quantity: u64) -> Self {
        Self {
            zone: Some(zone.into()),
            quantity,
            ..Default::default()
        }
    }
}

/// Product definition as submitted by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub ean: Ean,
    pub product_name: String,
    #[serde(default)]
    pub net_weight: f64,
    #[serde(default)]
    pub net_weight_unit: String,
    #[serde(default)]
    pub perishable: bool,
    #[serde(default)]
    pub locations: Vec<ProductSlot>,
}

impl ProductInput {
    fn validate(&self) -> Result<()> {
        validate_ean(&self.ean)?;
        if self.product_name.trim().is_empty() {
            return Err(InventoryError::validation("productName is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub ean: Ean,
    pub product_name: String,
    pub net_weight: f64,
    pub net_weight_unit: String,
    pub perishable: bool,
    pub locations: Vec<ProductSlot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";

    fn key(&self) -> String {
        self.ean.to_string()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Product {
    pub fn from_input(input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            ean: input.ean,
            product_name: input.product_name.trim().to_string(),
            net_weight: input.net_weight,
            net_weight_unit: input.net_weight_unit,
            perishable: input.perishable,
            locations: input.locations,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total configured capacity: the sum of every slot's quantity, saturating.
    pub fn limit_quantity(&self) -> u64 {
        crate::batch::total(self.locations.iter().map(|slot| slot.quantity))
    }
}

pub struct ProductCatalog<S: DocumentStore> {
    products: Repository<S, Product>,
}

impl<S: DocumentStore + Clone> Clone for ProductCatalog<S> {
    fn clone(&self) -> Self {
        Self {
            products: self.products.clone(),
        }
    }
}

impl<S: DocumentStore> ProductCatalog<S> {
    pub fn new(store: S) -> Self {
        Self {
            products: Repository::new(store),
        }
    }

    #[tracing::instrument(skip(self, input), fields(ean = %input.ean))]
    pub async fn register(&self, input: ProductInput) -> Result<Product> {
        input.validate()?;
        let ean = input.ean.clone();
        let stored = self
            .products
            .save(Stored::fresh(Product::from_input(input, Utc::now())))
            .await
            .map_err(|err| match err {
                InventoryError::Conflict { .. } => InventoryError::duplicate(format!(
                    "a product with ean {ean} already exists"
                )),
                other => other,
            })?;
        tracing::info!("product registered");
        Ok(stored.entity)
    }

    pub async fn get(&self, ean: &Ean) -> Result<Product> {
        self.products
            .load(ean.as_str())
            .await?
            .map(Stored::into_inner)
            .ok_or_else(|| InventoryError::not_found(format!("product {ean} not found")))
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        self.products.scan().await
    }

    /// Case-insensitive substring match on ean or product name.
    pub async fn search(&self, term: &str) -> Result<Vec<Product>> {
        let needle = term.trim().to_lowercase();
        Ok(self
            .products
            .scan()
            .await?
            .into_iter()
            .filter(|p| {
                p.ean.as_str().to_lowercase().contains(&needle)
                    || p.product_name.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Replaces a product's definition, keeping its ean and creation time.
    #[tracing::instrument(skip(self, input))]
    pub async fn update(&self, ean: &Ean, input: ProductInput) -> Result<Product> {
        let input = ProductInput {
            ean: ean.clone(),
            ..input
        };
        input.validate()?;
        let stored = self
            .products
            .update(ean.as_str(), |existing| {
                let existing = existing
                    .ok_or_else(|| InventoryError::not_found(format!("product {ean} not found")))?;
                let mut product = Product::from_input(input, Utc::now());
                product.created_at = existing.created_at;
                Ok(product)
            })
            .await?;
        tracing::info!("product updated");
        Ok(stored.entity)
    }

    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, ean: &Ean) -> Result<()> {
        if !self.products.delete(ean.as_str()).await? {
            return Err(InventoryError::not_found(format!("product {ean} not found")));
        }
        tracing::info!("product removed");
        Ok(())
    }
}
