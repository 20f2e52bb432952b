//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use document_store::InMemoryDocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let state = api::create_state(InMemoryDocumentStore::new(), &api::Config::default()).unwrap();
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn day_offset(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

fn intake(batch_number: &str, quantity: u64, expiry_days: i64) -> Value {
    json!({
        "ean": "111",
        "name": "Rice",
        "netWeight": 5.0,
        "netWeightUnit": "kg",
        "perishable": false,
        "batches": [{
            "batchNumber": batch_number,
            "quantity": quantity,
            "manufacturingDate": day_offset(-30),
            "expiryDate": day_offset(expiry_days)
        }]
    })
}

fn move_body(quantity: u64, zone: &str, expiry_days: i64) -> Value {
    json!({
        "ean": "111",
        "name": "Rice",
        "perishable": false,
        "batchNumber": "B1",
        "quantity": quantity,
        "zone": zone,
        "aisle": "A1",
        "manufacturingDate": day_offset(-30),
        "expiryDate": day_offset(expiry_days)
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_intake_creates_then_appends() {
    let app = setup();

    let (status, entry) = send(&app, "POST", "/inbound", Some(intake("B1", 100, 200))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["batches"][0]["quantity"], 100);

    let (status, entry) = send(&app, "POST", "/inbound", Some(intake("B2", 5, 200))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["batches"].as_array().unwrap().len(), 2);

    let (status, json) = send(&app, "POST", "/inbound", Some(intake("B1", 100, 200))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().is_some());

    let (status, entry) = send(&app, "GET", "/inbound/ean/111", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["name"], "Rice");

    let (status, today) = send(&app, "GET", "/inbound/batches/today", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_intake_validation() {
    let app = setup();

    let mut body = intake("B1", 10, 200);
    body["batches"][0]["expiryDate"] = json!(day_offset(-60));
    let (status, _) = send(&app, "POST", "/inbound", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/inbound", Some(json!({ "ean": "111" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/inbound?date=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_batch_fields() {
    let app = setup();
    let (_, entry) = send(&app, "POST", "/inbound", Some(intake("B1", 100, 200))).await;
    let batch_id = entry["batches"][0]["id"].as_str().unwrap().to_string();

    let (status, entry) = send(
        &app,
        "PUT",
        &format!("/inbound/ean/111/batch/{batch_id}"),
        Some(json!({ "quantity": 80 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["batches"][0]["quantity"], 80);

    let (status, _) = send(
        &app,
        "PUT",
        "/inbound/ean/111/batch/not-a-uuid",
        Some(json!({ "quantity": 80 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_move_conserves_quantity() {
    let app = setup();
    send(&app, "POST", "/inbound", Some(intake("B1", 100, 200))).await;

    let (status, outcome) = send(&app, "POST", "/move", Some(move_body(40, "Z1", 200))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["state"], "Recorded");
    assert_eq!(outcome["auditRecorded"], true);
    assert_eq!(outcome["inbound"]["batches"][0]["quantity"], 60);

    let (status, view) = send(&app, "GET", "/locations/111", None).await;
    assert_eq!(status, StatusCode::OK);
    let placed: u64 = view["batches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["quantity"].as_u64().unwrap())
        .sum();
    assert_eq!(placed, 40);

    let (status, records) = send(&app, "GET", "/inbound-records", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records.as_array().unwrap().len(), 1);

    let (status, summary) = send(&app, "GET", "/inbound-records/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["daily"], 1);
}

#[tokio::test]
async fn test_move_errors() {
    let app = setup();
    send(&app, "POST", "/inbound", Some(intake("B1", 10, 200))).await;

    let (status, json) = send(&app, "POST", "/move", Some(move_body(11, "Z1", 200))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("requested 11"));

    let mut unknown = move_body(1, "Z1", 200);
    unknown["ean"] = json!("999");
    let (status, _) = send(&app, "POST", "/move", Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/move", Some(move_body(0, "Z1", 200))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut missing_zone = move_body(1, "Z1", 200);
    missing_zone.as_object_mut().unwrap().remove("zone");
    let (status, _) = send(&app, "POST", "/move", Some(missing_zone)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transfer_and_reduce() {
    let app = setup();
    send(&app, "POST", "/inbound", Some(intake("B1", 100, 200))).await;
    send(&app, "POST", "/move", Some(move_body(50, "Z1", 200))).await;

    let (status, entry) = send(
        &app,
        "POST",
        "/locations/111/transfer",
        Some(json!({ "fromZone": "Z1", "toZone": "Z2", "quantity": 20 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let total: u64 = entry["batches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["quantity"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 50);

    let (status, reduced) = send(
        &app,
        "PATCH",
        "/locations/111/storage/Z2/reduce?aisle=A1",
        Some(json!({ "reduceBy": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reduced["batches"][0]["quantity"], 0);

    let (status, _) = send(
        &app,
        "PATCH",
        "/locations/111/storage/Z9/reduce",
        Some(json!({ "reduceBy": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/locations/111/transfer",
        Some(json!({ "fromZone": "Z1", "toZone": "Z2", "quantity": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_paginated_stock_and_search() {
    let app = setup();
    send(&app, "POST", "/inbound", Some(intake("B1", 100, 200))).await;
    send(&app, "POST", "/move", Some(move_body(40, "Z1", 200))).await;

    let (status, page) = send(&app, "GET", "/locations/all?page=1&limit=5&search=ric", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["quantity"], 40);

    let (status, found) = send(&app, "GET", "/locations/search?query=RICE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "GET", "/locations/search", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expiry_reports() {
    let app = setup();
    send(&app, "POST", "/inbound", Some(intake("B1", 100, 10))).await;
    send(&app, "POST", "/move", Some(move_body(40, "Z1", 10))).await;

    let (status, count) = send(&app, "GET", "/locations/count", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["totalExpiring"], 1);

    let (status, near) = send(&app, "GET", "/locations/expiring/near", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(near[0]["ean"], "111");

    let (status, mid) = send(&app, "GET", "/locations/expiring/mid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(mid.as_array().unwrap().is_empty());

    let (status, perishable) = send(&app, "GET", "/locations/expiring/perishable", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(perishable.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_expiry_endpoints_record_report_duration() {
    let app = setup();
    let (status, _) = send(&app, "GET", "/locations/expiring/near", None).await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let exposition = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(exposition.contains("report_duration_seconds"));
    assert!(exposition.contains(r#"report="expiry""#));
}

#[tokio::test]
async fn test_low_stock() {
    let app = setup();
    let (status, _) = send(
        &app,
        "POST",
        "/products",
        Some(json!({
            "ean": "111",
            "productName": "Rice",
            "locations": [{ "zone": "Z1", "quantity": 100 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    send(&app, "POST", "/inbound", Some(intake("B1", 100, 200))).await;
    send(&app, "POST", "/move", Some(move_body(20, "Z1", 200))).await;

    let (status, items) = send(&app, "GET", "/low-stock", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(items[0]["ean"], "111");
    assert_eq!(items[0]["currentStock"], 20);
    assert_eq!(items[0]["limitQuantity"], 100);
}

#[tokio::test]
async fn test_product_catalog() {
    let app = setup();
    let product = json!({ "ean": "222", "productName": "Beans", "perishable": true });

    let (status, _) = send(&app, "POST", "/products", Some(product.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/products", Some(product)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, found) = send(&app, "GET", "/products/search?query=bea", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app,
        "PUT",
        "/products/222",
        Some(json!({ "ean": "222", "productName": "Black Beans" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["productName"], "Black Beans");

    let (status, _) = send(&app, "DELETE", "/products/222", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", "/products/222", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_storage_registry() {
    let app = setup();

    let (status, added) = send(&app, "POST", "/registry/zone", Some(json!({ "name": " Z1 " }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["names"], json!(["Z1"]));

    let (status, _) = send(&app, "POST", "/registry/zone", Some(json!({ "name": "Z1" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, renamed) = send(
        &app,
        "PUT",
        "/registry/zone",
        Some(json!({ "oldName": "Z1", "newName": "Z2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["names"], json!(["Z2"]));

    let (status, snapshot) = send(&app, "GET", "/registry", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["zone"], json!(["Z2"]));

    let (status, _) = send(&app, "DELETE", "/registry/zone/Z9", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/registry/planet", Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
