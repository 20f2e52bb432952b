//! Audit trail endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use chrono::Utc;
use document_store::DocumentStore;
use domain::{DateRange, InboundRecord, RecordSummary, time};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Optional inclusive local-day range; a lone bound covers that single day.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeParams {
    fn into_range(self) -> Result<Option<DateRange>, ApiError> {
        let start = self.start.as_deref().map(time::parse_day).transpose()?;
        let end = self.end.as_deref().map(time::parse_day).transpose()?;
        let range = match (start, end) {
            (Some(first), Some(last)) => Some(DateRange::days(first, last)?),
            (Some(day), None) | (None, Some(day)) => Some(DateRange::day(day)),
            (None, None) => None,
        };
        Ok(range)
    }
}

/// GET /inbound-records?start&end
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    params: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<InboundRecord>>, ApiError> {
    let Query(params) = params?;
    let range = params.into_range()?;
    Ok(Json(state.records.list(range).await?))
}

/// GET /inbound-records/summary: daily, weekly and monthly record counts.
#[tracing::instrument(skip(state))]
pub async fn summary<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<RecordSummary>, ApiError> {
    Ok(Json(
        reports::run(&state.inbound_summary, Utc::now()).await?,
    ))
}
