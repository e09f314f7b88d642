use std::sync::Arc;

use axum::{extract::State, response::Json};

use ndris_common::{DistrictMetrics, DistrictSummary, RecomputeReport};
use ndris_domains::records::normalize_district;

use super::extract::ApiPath;
use super::ApiResult;
use crate::AppState;

/// All districts, highest neglect first, with level and color for the map.
pub async fn api_neglect_all(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<DistrictSummary>>> {
    let records = state.engine.get_all().await?;
    Ok(Json(records.into_iter().map(DistrictSummary::from).collect()))
}

pub async fn api_neglect_recompute(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<RecomputeReport>> {
    Ok(Json(state.engine.recompute_all().await?))
}

pub async fn api_district_summary(
    State(state): State<Arc<AppState>>,
    ApiPath(district): ApiPath<String>,
) -> ApiResult<Json<DistrictSummary>> {
    let district = normalize_district(&district)?;
    Ok(Json(state.engine.district_summary(&district).await?))
}

/// Live metrics straight from the record stores; the stored row is untouched.
pub async fn api_district_metrics(
    State(state): State<Arc<AppState>>,
    ApiPath(district): ApiPath<String>,
) -> ApiResult<Json<DistrictMetrics>> {
    let district = normalize_district(&district)?;
    Ok(Json(state.engine.compute_score(&district).await?))
}

pub async fn api_district_refresh(
    State(state): State<Arc<AppState>>,
    ApiPath(district): ApiPath<String>,
) -> ApiResult<Json<DistrictSummary>> {
    let district = normalize_district(&district)?;
    let record = state.engine.upsert(&district).await?;
    Ok(Json(DistrictSummary::from(record)))
}
