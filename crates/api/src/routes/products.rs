//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::Ean;
use document_store::DocumentStore;
use domain::{Product, ProductInput};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// POST /products
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(input) = payload?;
    let product = state.catalog.register(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list().await?))
}

/// GET /products/search?query=
#[tracing::instrument(skip(state))]
pub async fn search<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(params) = params?;
    Ok(Json(
        state
            .catalog
            .search(params.query.as_deref().unwrap_or_default())
            .await?,
    ))
}

/// GET /products/{ean}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(ean): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.get(&Ean::new(ean)).await?))
}

/// PUT /products/{ean}
#[tracing::instrument(skip(state, payload))]
pub async fn update<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(ean): Path<String>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.catalog.update(&Ean::new(ean), input).await?))
}

/// DELETE /products/{ean}
#[tracing::instrument(skip(state))]
pub async fn remove<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(ean): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.catalog.remove(&Ean::new(ean)).await?;
    Ok(StatusCode::NO_CONTENT)
}
