//! Shared application state.

use document_store::DocumentStore;
use domain::{InboundLedger, InboundRecordLog, LocationStore, ProductCatalog, StorageRegistry};
use reports::{ExpiryClassifier, InboundSummary, LowStockDetector, ReportError, Threshold};
use saga::MoveCoordinator;

use crate::config::Config;

/// Services every handler can reach, all over one document store.
pub struct AppState<S: DocumentStore> {
    pub inbound: InboundLedger<S>,
    pub locations: LocationStore<S>,
    pub records: InboundRecordLog<S>,
    pub catalog: ProductCatalog<S>,
    pub registry: StorageRegistry<S>,
    pub mover: MoveCoordinator<S>,
    pub expiry: ExpiryClassifier<S>,
    pub low_stock: LowStockDetector<S>,
    pub inbound_summary: InboundSummary<S>,
}

impl<S: DocumentStore + Clone> AppState<S> {
    /// Builds the services, applying the report settings from `config`.
    pub fn new(store: S, config: &Config) -> Result<Self, ReportError> {
        let threshold = Threshold::from_fraction(config.low_stock_fraction)?;
        let locations = LocationStore::new(store.clone());
        let catalog = ProductCatalog::new(store.clone());
        let records = InboundRecordLog::new(store.clone());

        Ok(Self {
            inbound: InboundLedger::new(store.clone()),
            locations: locations.clone(),
            records: records.clone(),
            catalog: catalog.clone(),
            registry: StorageRegistry::new(store.clone()),
            mover: MoveCoordinator::new(store),
            expiry: ExpiryClassifier::new(locations.clone())
                .with_exclusion(config.expiry_exclusion),
            low_stock: LowStockDetector::new(catalog, locations).with_threshold(threshold),
            inbound_summary: InboundSummary::new(records),
        })
    }
}
