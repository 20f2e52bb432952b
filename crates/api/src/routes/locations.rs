//! Placed stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use common::{Ean, Placement};
use document_store::DocumentStore;
use domain::{
    Batch, LocationEntry, LocationView, Reduction, StockPage, StockQuery,
    Transfer, time,
};
use serde::{Deserialize, Serialize};

use super::DateFilter;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
}

impl PageParams {
    fn into_query(self) -> StockQuery {
        let mut query = StockQuery::new();
        if let Some(page) = self.page {
            query = query.page(page);
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(search) = self.search {
            query = query.search(search);
        }
        query
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

/// Finer placement parts of a reduction, given as query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SlotParams {
    pub aisle: Option<String>,
    pub rack: Option<String>,
    pub shelf: Option<String>,
    pub bin: Option<String>,
    pub pallet: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceRequest {
    pub reduce_by: u64,
    #[serde(default)]
    pub batch_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReduceResponse {
    pub placement: Placement,
    pub batches: Vec<Batch>,
}

/// GET /locations?date=YYYY-MM-DD: entries with a batch placed that day, or all.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    filter: Result<Query<DateFilter>, QueryRejection>,
) -> Result<Json<Vec<LocationEntry>>, ApiError> {
    let Query(filter) = filter?;
    let day = filter.date.as_deref().map(time::parse_day).transpose()?;
    Ok(Json(state.locations.list(day).await?))
}

/// GET /locations/all?page&limit&search: stock totals per product, paged.
#[tracing::instrument(skip(state))]
pub async fn all_zones<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<StockPage>, ApiError> {
    let Query(params) = params?;
    Ok(Json(
        state
            .locations
            .aggregate_all_zones_paginated(params.into_query())
            .await?,
    ))
}

/// GET /locations/search?query=: exact ean or name substring.
#[tracing::instrument(skip(state))]
pub async fn search<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<LocationEntry>>, ApiError> {
    let Query(params) = params?;
    let term = params.query.unwrap_or_default();
    Ok(Json(state.locations.search(&term).await?))
}

/// GET /locations/{ean}: every placed batch of a product.
#[tracing::instrument(skip(state))]
pub async fn by_ean<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(ean): Path<String>,
) -> Result<Json<LocationView>, ApiError> {
    Ok(Json(state.locations.find_by_ean(&Ean::new(ean)).await?))
}

/// POST /locations/{ean}/transfer: move placed stock between zones.
#[tracing::instrument(skip(state, payload))]
pub async fn transfer<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(ean): Path<String>,
    payload: Result<Json<Transfer>, JsonRejection>,
) -> Result<Json<LocationEntry>, ApiError> {
    let Json(transfer) = payload?;
    Ok(Json(
        state
            .locations
            .transfer(&Ean::new(ean), transfer)
            .await?,
    ))
}

/// PATCH /locations/{ean}/storage/{zone}/reduce?aisle&rack&shelf&bin&pallet
#[tracing::instrument(skip(state, slot, payload))]
pub async fn reduce<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((ean, zone)): Path<(String, String)>,
    slot: Result<Query<SlotParams>, QueryRejection>,
    payload: Result<Json<ReduceRequest>, JsonRejection>,
) -> Result<Json<ReduceResponse>, ApiError> {
    let Query(slot) = slot?;
    let Json(request) = payload?;

    let placement = Placement {
        zone,
        aisle: slot.aisle,
        rack: slot.rack,
        shelf: slot.shelf,
        bin: slot.bin,
        pallet: slot.pallet,
    };
    let mut reduction = Reduction::new(placement.clone(), request.reduce_by);
    if let Some(number) = request.batch_number {
        reduction = reduction.batch_number(number);
    }

    let batches = state.locations.reduce(&Ean::new(ean), reduction).await?;
    Ok(Json(ReduceResponse { placement, batches }))
}
