//! Move input and result.

use common::{Ean, Placement};
use domain::inbound::validate_ean;
use domain::{BatchDates, InboundEntry, InventoryError, LocationEntry, LocationKey};
use serde::{Deserialize, Serialize};

use crate::state::MoveState;

/// A request to move part of an inbound batch to a storage placement.
///
/// Deserializes from the flat wire shape
/// `{ean, name, perishable, batchNumber, quantity, zone, aisle, rack,
/// shelf, bin, pallet, manufacturingDate, expiryDate}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub ean: Ean,
    pub name: String,
    #[serde(default)]
    pub perishable: bool,
    pub batch_number: String,
    pub quantity: u64,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(flatten)]
    pub dates: BatchDates,
}

impl MoveRequest {
    pub fn new(
        key: LocationKey,
        batch_number: impl Into<String>,
        quantity: u64,
        placement: Placement,
        dates: BatchDates,
    ) -> Self {
        Self {
            ean: key.ean,
            name: key.name,
            perishable: key.perishable,
            batch_number: batch_number.into(),
            quantity,
            placement,
            dates,
        }
    }

    /// Key of the location entry and audit record the move lands in.
    pub fn location_key(&self) -> LocationKey {
        LocationKey::new(self.ean.clone(), self.name.trim(), self.perishable)
    }

    pub fn batch_number(&self) -> &str {
        self.batch_number.trim()
    }

    /// Rejects requests that cannot be moved before anything is read.
    pub fn validate(&self) -> Result<(), InventoryError> {
        validate_ean(&self.ean)?;
        if self.name.trim().is_empty() {
            return Err(InventoryError::validation("product name is required"));
        }
        if self.batch_number().is_empty() {
            return Err(InventoryError::validation("batch number is required"));
        }
        if self.placement.zone.trim().is_empty() {
            return Err(InventoryError::validation("zone is required"));
        }
        if self.quantity == 0 {
            return Err(InventoryError::validation(
                "quantity must be greater than zero",
            ));
        }
        self.dates.validate()
    }
}

/// Result of a completed move.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub state: MoveState,
    /// The inbound entry after the withdrawal. Kept even when no batches remain.
    pub inbound: InboundEntry,
    /// The location entry the quantity landed in.
    pub location: LocationEntry,
    /// False when the audit append failed after the move committed.
    pub audit_recorded: bool,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn dates() -> BatchDates {
        let mfg = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        BatchDates::new(mfg, mfg + Duration::days(365))
    }

    fn request() -> MoveRequest {
        MoveRequest::new(
            LocationKey::new("111", "Rice", false),
            "B1",
            40,
            Placement::in_zone("Z1").aisle("A1"),
            dates(),
        )
    }

    #[test]
    fn deserializes_flat_wire_shape() {
        let json = serde_json::json!({
            "ean": "111",
            "name": "Rice",
            "perishable": true,
            "batchNumber": "B1",
            "quantity": 40,
            "zone": "Z1",
            "aisle": "A1",
            "bin": "B2",
            "manufacturingDate": "2024-01-01",
            "expiryDate": "2025-01-01T00:00:00Z"
        });
        let request: MoveRequest = serde_json::from_value(json).unwrap();

        assert_eq!(request.ean, Ean::new("111"));
        assert!(request.perishable);
        assert_eq!(request.quantity, 40);
        assert_eq!(
            request.placement,
            Placement::in_zone("Z1").aisle("A1").bin("B2")
        );
        assert!(request.dates.expiry_date > request.dates.manufacturing_date);
    }

    #[test]
    fn missing_zone_is_rejected_by_the_decoder() {
        let json = serde_json::json!({
            "ean": "111",
            "name": "Rice",
            "batchNumber": "B1",
            "quantity": 40,
            "manufacturingDate": "2024-01-01",
            "expiryDate": "2025-01-01"
        });
        assert!(serde_json::from_value::<MoveRequest>(json).is_err());
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn validation_failures() {
        let mut r = request();
        r.quantity = 0;
        assert!(matches!(r.validate(), Err(InventoryError::Validation(_))));

        let mut r = request();
        r.name = "  ".to_string();
        assert!(matches!(r.validate(), Err(InventoryError::Validation(_))));

        let mut r = request();
        r.batch_number = String::new();
        assert!(matches!(r.validate(), Err(InventoryError::Validation(_))));

        let mut r = request();
        r.placement.zone = String::new();
        assert!(matches!(r.validate(), Err(InventoryError::Validation(_))));

        let mut r = request();
        r.ean = Ean::new("");
        assert!(matches!(r.validate(), Err(InventoryError::Validation(_))));

        let mut r = request();
        r.dates = BatchDates::new(r.dates.expiry_date, r.dates.manufacturing_date);
        assert!(matches!(r.validate(), Err(InventoryError::Validation(_))));
    }

    #[test]
    fn location_key_trims_name() {
        let mut r = request();
        r.name = " Rice ".to_string();
        assert_eq!(r.location_key().document_key(), "111/false/Rice");
    }
}
