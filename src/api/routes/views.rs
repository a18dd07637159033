//! Published tables joined with per-version entity metadata.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::routes::parse_params;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{
    AugmentStats, Category, League, Region, StatsDocument, StatsParams, TraitStats, UnitStats,
};
use crate::reference::{
    enrich_augments, enrich_traits, enrich_units, MissingReference, ReferenceData, ReferenceError,
};
use crate::storage::StatsStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewsResponse<V> {
    #[serde(rename = "type")]
    pub category: Category,
    pub region: Region,
    pub version: String,
    pub league: League,
    pub count: usize,
    #[serde(rename = "lastUpdatedTS")]
    pub last_updated_ts: i64,
    pub value: Vec<V>,
    /// Ids with no (or inconsistent) metadata.
    pub warnings: Vec<String>,
}

impl<V> ViewsResponse<V> {
    fn new<T>(doc: StatsDocument<T>, (value, missing): (Vec<V>, Vec<MissingReference>)) -> Self {
        Self {
            category: doc.category,
            region: doc.region,
            version: doc.version,
            league: doc.league,
            count: doc.count,
            last_updated_ts: doc.last_updated_ts,
            value,
            warnings: missing.iter().map(ToString::to_string).collect(),
        }
    }
}

fn load_reference(state: &AppState, version: &str) -> Result<ReferenceData, ApiError> {
    let path = state.storage.reference_path(version);
    ReferenceData::load(version, &path).map_err(|e| match e {
        ReferenceError::NotFound(path) => {
            ApiError::NotFound(format!("reference data {}", path.display()))
        }
        other => ApiError::Internal(other.to_string()),
    })
}

fn render(state: &AppState, params: &StatsParams) -> Result<serde_json::Value, ApiError> {
    let store = StatsStore::new(&state.storage);
    let data = load_reference(state, &params.version)?;

    let body = match params.category {
        Category::Units => {
            let doc = store.read::<UnitStats>(params)?;
            let views = enrich_units(&doc.value, &data);
            serde_json::to_value(ViewsResponse::new(doc, views))
        }
        Category::Traits => {
            let doc = store.read::<TraitStats>(params)?;
            let views = enrich_traits(&doc.value, &data);
            serde_json::to_value(ViewsResponse::new(doc, views))
        }
        Category::Augments => {
            let doc = store.read::<AugmentStats>(params)?;
            let views = enrich_augments(&doc.value, &data);
            serde_json::to_value(ViewsResponse::new(doc, views))
        }
    };

    body.map_err(|e| ApiError::Internal(e.to_string()))
}

/// A published table with display names, icons and descriptions resolved.
pub async fn get_views(
    State(state): State<AppState>,
    Path(segments): Path<(String, String, String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let params = parse_params(segments)?;
    Ok(Json(render(&state, &params)?))
}
