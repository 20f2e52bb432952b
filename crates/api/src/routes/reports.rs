//! Expiry and low-stock report endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use document_store::DocumentStore;
use reports::{ExpiryBucket, LowStockItem};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringCountResponse {
    pub total_expiring: usize,
}

/// GET /locations/count: distinct products with stock expiring in any window.
#[tracing::instrument(skip(state))]
pub async fn expiring_count<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<ExpiringCountResponse>, ApiError> {
    let total_expiring = state.expiry.total_expiring_count(Utc::now()).await?;
    Ok(Json(ExpiringCountResponse { total_expiring }))
}

/// GET /locations/expiring/perishable: perishables expiring within three days.
#[tracing::instrument(skip(state))]
pub async fn perishable_soon<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ExpiryBucket>>, ApiError> {
    Ok(Json(reports::run(&state.expiry, Utc::now()).await?.perishable_soon))
}

/// GET /locations/expiring/near: non-perishables expiring within a month.
#[tracing::instrument(skip(state))]
pub async fn near<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ExpiryBucket>>, ApiError> {
    Ok(Json(reports::run(&state.expiry, Utc::now()).await?.near))
}

/// GET /locations/expiring/mid: non-perishables expiring in one to three months.
#[tracing::instrument(skip(state))]
pub async fn mid<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ExpiryBucket>>, ApiError> {
    Ok(Json(reports::run(&state.expiry, Utc::now()).await?.mid))
}

/// GET /low-stock
#[tracing::instrument(skip(state))]
pub async fn low_stock<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<LowStockItem>>, ApiError> {
    Ok(Json(reports::run(&state.low_stock, Utc::now()).await?))
}
