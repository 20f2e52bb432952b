//! HTTP API server with observability for the warehouse inventory system.
//!
//! Provides REST endpoints for intake, moves into storage, placed stock,
//! expiry and low-stock reports and reference data, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use document_store::DocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Intake
        .route(
            "/inbound",
            post(routes::inbound::receive::<S>).get(routes::inbound::list::<S>),
        )
        .route(
            "/inbound/batches/today",
            get(routes::inbound::batches_today::<S>),
        )
        .route("/inbound/ean/{ean}", get(routes::inbound::by_ean::<S>))
        .route(
            "/inbound/history/{ean}",
            get(routes::inbound::history::<S>),
        )
        .route(
            "/inbound/ean/{ean}/batch/{batch_id}",
            put(routes::inbound::update_batch::<S>),
        )
        .route("/move", post(routes::moves::execute::<S>))
        // Placed stock
        .route("/locations", get(routes::locations::list::<S>))
        .route("/locations/all", get(routes::locations::all_zones::<S>))
        .route("/locations/search", get(routes::locations::search::<S>))
        .route("/locations/count", get(routes::reports::expiring_count::<S>))
        .route(
            "/locations/expiring/perishable",
            get(routes::reports::perishable_soon::<S>),
        )
        .route("/locations/expiring/near", get(routes::reports::near::<S>))
        .route("/locations/expiring/mid", get(routes::reports::mid::<S>))
        .route("/locations/{ean}", get(routes::locations::by_ean::<S>))
        .route(
            "/locations/{ean}/transfer",
            post(routes::locations::transfer::<S>),
        )
        .route(
            "/locations/{ean}/storage/{zone}/reduce",
            patch(routes::locations::reduce::<S>),
        )
        // Reports and audit trail
        .route("/low-stock", get(routes::reports::low_stock::<S>))
        .route("/inbound-records", get(routes::records::list::<S>))
        .route(
            "/inbound-records/summary",
            get(routes::records::summary::<S>),
        )
        // Reference data
        .route(
            "/products",
            post(routes::products::create::<S>).get(routes::products::list::<S>),
        )
        .route("/products/search", get(routes::products::search::<S>))
        .route(
            "/products/{ean}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::remove::<S>),
        )
        .route("/registry", get(routes::registry::snapshot::<S>))
        .route(
            "/registry/{category}",
            post(routes::registry::add::<S>).put(routes::registry::rename::<S>),
        )
        .route(
            "/registry/{category}/{name}",
            axum::routing::delete(routes::registry::remove::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store`.
pub fn create_state<S: DocumentStore + Clone + 'static>(
    store: S,
    config: &Config,
) -> Result<Arc<AppState<S>>, reports::ReportError> {
    Ok(Arc::new(AppState::new(store, config)?))
}
