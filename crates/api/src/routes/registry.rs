//! Storage registry endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use document_store::DocumentStore;
use domain::StorageCategory;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddEntry {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameEntry {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: StorageCategory,
    pub names: Vec<String>,
}

/// GET /registry: every category with its names.
#[tracing::instrument(skip(state))]
pub async fn snapshot<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<BTreeMap<StorageCategory, Vec<String>>>, ApiError> {
    Ok(Json(state.registry.snapshot().await?))
}

/// POST /registry/{category}
#[tracing::instrument(skip(state, payload))]
pub async fn add<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(category): Path<String>,
    payload: Result<Json<AddEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let category: StorageCategory = category.parse()?;
    let Json(entry) = payload?;
    let names = state.registry.add(category, &entry.name).await?;
    Ok((StatusCode::CREATED, Json(CategoryResponse { category, names })))
}

/// PUT /registry/{category}
#[tracing::instrument(skip(state, payload))]
pub async fn rename<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(category): Path<String>,
    payload: Result<Json<RenameEntry>, JsonRejection>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category: StorageCategory = category.parse()?;
    let Json(entry) = payload?;
    let names = state
        .registry
        .rename(category, &entry.old_name, &entry.new_name)
        .await?;
    Ok(Json(CategoryResponse { category, names }))
}

/// DELETE /registry/{category}/{name}
#[tracing::instrument(skip(state))]
pub async fn remove<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((category, name)): Path<(String, String)>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category: StorageCategory = category.parse()?;
    let names = state.registry.remove(category, &name).await?;
    Ok(Json(CategoryResponse { category, names }))
}
