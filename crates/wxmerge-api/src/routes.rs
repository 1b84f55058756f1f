//! API route handlers

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use wxmerge_weather::{MergedRecord, UpstreamRecord};

use crate::error::ApiError;
use crate::AppState;

/// `start` and `end` query parameters shared by every data endpoint
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeParams {
    /// Absent parameters read as empty, which range validation rejects.
    fn bounds(&self) -> (&str, &str) {
        (
            self.start.as_deref().unwrap_or_default(),
            self.end.as_deref().unwrap_or_default(),
        )
    }
}

/// Liveness probe
pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `GET /temperatures?start=..&end=..` -> `[{"temp", "date"}, ..]`
pub async fn temperatures(
    State(state): State<AppState>,
    query: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<UpstreamRecord>>, ApiError> {
    let Query(params) = query?;
    let (start, end) = params.bounds();
    Ok(Json(state.aggregator.fetch_temperatures(start, end).await?))
}

/// `GET /speeds?start=..&end=..` -> `[{"north", "west", "date"}, ..]`
pub async fn speeds(
    State(state): State<AppState>,
    query: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<UpstreamRecord>>, ApiError> {
    let Query(params) = query?;
    let (start, end) = params.bounds();
    Ok(Json(state.aggregator.fetch_speeds(start, end).await?))
}

/// `GET /weather?start=..&end=..` -> `[{"temp", "north", "west", "date"}, ..]`
pub async fn weather(
    State(state): State<AppState>,
    query: Result<Query<RangeParams>, QueryRejection>,
) -> Result<Json<Vec<MergedRecord>>, ApiError> {
    let Query(params) = query?;
    let (start, end) = params.bounds();
    Ok(Json(state.aggregator.fetch_weather(start, end).await?))
}
