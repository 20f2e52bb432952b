//! Intake and inbound ledger endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{BatchId, Ean};
use document_store::DocumentStore;
use domain::{Batch, BatchUpdate, InboundEntry, Intake, time};

use super::DateFilter;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /inbound: receive batches for a product.
///
/// Responds 201 when the product's entry was created, 200 when the batches
/// were appended to an existing entry.
#[tracing::instrument(skip(state, payload))]
pub async fn receive<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<Intake>, JsonRejection>,
) -> Result<(StatusCode, Json<InboundEntry>), ApiError> {
    let Json(intake) = payload?;
    let received = state.inbound.receive(intake).await?;
    let status = if received.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(received.entry)))
}

/// GET /inbound?date=YYYY-MM-DD: entries created on a local day (default today).
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    filter: Result<Query<DateFilter>, QueryRejection>,
) -> Result<Json<Vec<InboundEntry>>, ApiError> {
    let Query(filter) = filter?;
    let day = match filter.date.as_deref() {
        Some(raw) => time::parse_day(raw)?,
        None => time::today(),
    };
    Ok(Json(state.inbound.list_for_day(day).await?))
}

/// GET /inbound/batches/today: entries holding a batch received today.
#[tracing::instrument(skip(state))]
pub async fn batches_today<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<InboundEntry>>, ApiError> {
    Ok(Json(
        state
            .inbound
            .list_batches_received_on(time::today())
            .await?,
    ))
}

/// GET /inbound/ean/{ean}
#[tracing::instrument(skip(state))]
pub async fn by_ean<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(ean): Path<String>,
) -> Result<Json<InboundEntry>, ApiError> {
    Ok(Json(state.inbound.find_by_ean(&Ean::new(ean)).await?))
}

/// GET /inbound/history/{ean}: the batch lines still held for an ean.
#[tracing::instrument(skip(state))]
pub async fn history<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(ean): Path<String>,
) -> Result<Json<Vec<Batch>>, ApiError> {
    Ok(Json(state.inbound.history(&Ean::new(ean)).await?))
}

/// PUT /inbound/ean/{ean}/batch/{batchId}: partial update of one batch line.
#[tracing::instrument(skip(state, payload))]
pub async fn update_batch<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<(String, BatchId)>, PathRejection>,
    payload: Result<Json<BatchUpdate>, JsonRejection>,
) -> Result<Json<InboundEntry>, ApiError> {
    let Path((ean, batch_id)) = path?;
    let Json(update) = payload?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("no fields to update".to_string()));
    }
    Ok(Json(
        state
            .inbound
            .update_batch_fields(&Ean::new(ean), batch_id, update)
            .await?,
    ))
}
