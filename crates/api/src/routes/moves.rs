//! Move endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use document_store::DocumentStore;
use saga::{MoveOutcome, MoveRequest};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /move: move part of an inbound batch into storage.
#[tracing::instrument(skip(state, payload))]
pub async fn execute<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveOutcome>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.mover.execute(request).await?))
}
