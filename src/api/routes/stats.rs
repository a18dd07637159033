use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::routes::parse_params;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::StatsParams;
use crate::storage::{ParamsIndex, StatsStore};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The persisted discovery list, in its stored order.
pub async fn list_params(
    State(state): State<AppState>,
) -> Result<Json<Vec<StatsParams>>, ApiError> {
    let params = ParamsIndex::new(&state.storage).all()?;
    Ok(Json(params))
}

/// A published document, served as stored.
pub async fn get_stats(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let params = parse_params(segments)?;
    let doc = StatsStore::new(&state.storage).read_raw(&params)?;
    Ok(Json(doc))
}
