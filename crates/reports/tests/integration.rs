//! Integration tests: location store and catalog writes → reports.

use chrono::{DateTime, Duration, Utc};
use common::{Ean, Placement};
use document_store::InMemoryDocumentStore;
use domain::{
    BatchDates, InboundRecordLog, LocationKey, LocationStore, ProductCatalog, ProductInput,
    ProductSlot, RecordedMove,
};
use reports::{
    ExclusionKey, ExpiryClassifier, InboundSummary, LowStockDetector, Report, Threshold,
};

struct Fixture {
    catalog: ProductCatalog<InMemoryDocumentStore>,
    locations: LocationStore<InMemoryDocumentStore>,
    records: InboundRecordLog<InMemoryDocumentStore>,
}

fn setup() -> Fixture {
    let store = InMemoryDocumentStore::new();
    Fixture {
        catalog: ProductCatalog::new(store.clone()),
        locations: LocationStore::new(store.clone()),
        records: InboundRecordLog::new(store),
    }
}

fn expiring_at(expiry: DateTime<Utc>) -> BatchDates {
    BatchDates::new(expiry - Duration::days(180), expiry)
}

impl Fixture {
    async fn product(&self, ean: &str, name: &str, capacity: u64) {
        self.catalog
            .register(ProductInput {
                ean: Ean::new(ean),
                product_name: name.to_string(),
                net_weight: 1.0,
                net_weight_unit: "kg".to_string(),
                perishable: false,
                locations: vec![ProductSlot::in_zone("Z1", capacity)],
            })
            .await
            .unwrap();
    }

    async fn place(&self, ean: &str, name: &str, perishable: bool, quantity: u64, expiry: DateTime<Utc>) {
        self.locations
            .upsert_placement(
                &LocationKey::new(ean, name, perishable),
                &format!("B-{}", expiry.timestamp()),
                quantity,
                expiring_at(expiry),
                &Placement::in_zone("Z1"),
            )
            .await
            .unwrap();
    }
}

mod expiry {
    use super::*;

    #[tokio::test]
    async fn perishable_batch_in_two_days_is_flagged_ten_days_is_not() {
        let f = setup();
        let now = Utc::now();
        f.place("111", "Milk", true, 5, now + Duration::days(2)).await;
        f.place("222", "Cream", true, 5, now + Duration::days(10)).await;

        let classifier = ExpiryClassifier::new(f.locations.clone());
        let soon = classifier.perishable_soon(now).await.unwrap();
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].ean, Ean::new("111"));
    }

    #[tokio::test]
    async fn total_count_deduplicates_products() {
        let f = setup();
        let now = Utc::now();
        f.place("111", "Rice", false, 5, now + Duration::days(3)).await;
        f.place("111", "Rice", false, 5, now + Duration::days(70)).await;
        f.place("222", "Milk", true, 5, now + Duration::days(1)).await;
        f.place("333", "Salt", false, 5, now + Duration::days(500)).await;

        let classifier = ExpiryClassifier::new(f.locations.clone());
        assert_eq!(classifier.total_expiring_count(now).await.unwrap(), 2);

        let report = reports::run(&classifier, now).await.unwrap();
        assert_eq!(report.near.len(), 1);
        assert!(report.mid.is_empty());
        assert_eq!(report.perishable_soon.len(), 1);
    }

    #[tokio::test]
    async fn exclusion_key_is_configurable() {
        let f = setup();
        let now = Utc::now();
        f.place("111", "Rice", false, 5, now + Duration::days(3)).await;
        f.place("999", "Rice", false, 5, now + Duration::days(70)).await;

        let by_name = ExpiryClassifier::new(f.locations.clone());
        assert!(by_name.mid(now).await.unwrap().is_empty());

        let by_ean = ExpiryClassifier::new(f.locations.clone()).with_exclusion(ExclusionKey::Ean);
        let mid = by_ean.mid(now).await.unwrap();
        assert_eq!(mid.len(), 1);
        assert_eq!(mid[0].ean, Ean::new("999"));
    }
}

mod low_stock {
    use super::*;

    #[tokio::test]
    async fn boundary_is_inclusive() {
        let f = setup();
        let expiry = Utc::now() + Duration::days(200);
        f.product("111", "Rice", 100).await;
        f.product("222", "Beans", 100).await;
        f.place("111", "Rice", false, 20, expiry).await;
        f.place("222", "Beans", false, 21, expiry).await;

        let low = LowStockDetector::new(f.catalog.clone(), f.locations.clone())
            .detect()
            .await
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].ean, Ean::new("111"));
        assert_eq!(low[0].current_stock, 20);
        assert_eq!(low[0].limit_quantity, 100);
    }

    #[tokio::test]
    async fn unplaced_products_are_skipped_and_results_sorted() {
        let f = setup();
        let expiry = Utc::now() + Duration::days(200);
        for (ean, name, stock) in [("111", "A", 15), ("222", "B", 3), ("333", "C", 9)] {
            f.product(ean, name, 100).await;
            f.place(ean, name, false, stock, expiry).await;
        }
        f.product("444", "Never placed", 100).await;

        let low = LowStockDetector::new(f.catalog.clone(), f.locations.clone())
            .detect()
            .await
            .unwrap();
        let stocks: Vec<_> = low.iter().map(|i| i.current_stock).collect();
        assert_eq!(stocks, vec![3, 9, 15]);
        assert!(low.windows(2).all(|w| w[0].current_stock <= w[1].current_stock));
    }

    #[tokio::test]
    async fn emptied_product_is_still_reported() {
        let f = setup();
        f.product("111", "Rice", 100).await;
        f.place("111", "Rice", false, 0, Utc::now() + Duration::days(200)).await;

        let detector = LowStockDetector::new(f.catalog.clone(), f.locations.clone())
            .with_threshold(Threshold::from_fraction(0.0).unwrap());
        let low = reports::run(&detector, Utc::now()).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].current_stock, 0);
    }
}

#[tokio::test]
async fn inbound_summary_counts_todays_records() {
    let f = setup();
    let now = Utc::now();
    f.records
        .append(
            &LocationKey::new("111", "Rice", false),
            RecordedMove::new(
                "B1",
                40,
                Placement::in_zone("Z1"),
                expiring_at(now + Duration::days(10)),
                now,
            ),
        )
        .await
        .unwrap();

    let summary = InboundSummary::new(f.records.clone());
    assert_eq!(summary.name(), "inbound_summary");
    let counts = summary.generate(now).await.unwrap();
    assert_eq!((counts.daily, counts.weekly, counts.monthly), (1, 1, 1));
}
