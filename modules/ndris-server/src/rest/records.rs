//! Record-store endpoints. Writes that change a district's data refresh that
//! district's index row when `index.refresh_on_write` is set.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use tracing::info;

use ndris_domains::records::{
    CategoryCount, Disaster, DisasterFilters, DisasterUpdate, Grievance, GrievanceFilters,
    GrievanceStatus, GrievanceUpdate, NewDisaster, NewGrievance, NewPolicy, Policy, PolicyFilters,
    PolicyUpdate, SectorStats,
};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::{parse_id, refresh_districts, ApiError, ApiResult};
use crate::AppState;

#[derive(Deserialize)]
pub struct StatusUpdate {
    status: String,
}

// --- Grievances ---

pub async fn api_grievances(
    State(state): State<Arc<AppState>>,
    ApiQuery(filters): ApiQuery<GrievanceFilters>,
) -> ApiResult<Json<Vec<Grievance>>> {
    Ok(Json(Grievance::list(&filters, &state.pool).await?))
}

pub async fn api_create_grievance(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewGrievance>,
) -> ApiResult<(StatusCode, Json<Grievance>)> {
    let grievance = Grievance::create(&body, &state.pool).await?;
    info!(id = %grievance.id, district = %grievance.district, "Grievance submitted");
    refresh_districts(&state.engine, state.refresh_on_write, &[grievance.district.as_str()]).await;
    Ok((StatusCode::CREATED, Json(grievance)))
}

pub async fn api_grievance(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Grievance>> {
    let id = parse_id(&id)?;
    Grievance::find_by_id(id, &state.pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Grievance not found"))
}

pub async fn api_update_grievance(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<GrievanceUpdate>,
) -> ApiResult<Json<Grievance>> {
    let id = parse_id(&id)?;
    let updated = Grievance::update(id, &body, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Grievance not found"))?;
    info!(id = %id, district = %updated.record.district, "Grievance updated");
    refresh_districts(&state.engine, state.refresh_on_write, &updated.touched_districts()).await;
    Ok(Json(updated.record))
}

pub async fn api_grievance_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CategoryCount>>> {
    Ok(Json(Grievance::category_stats(&state.pool).await?))
}

pub async fn api_update_grievance_status(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> ApiResult<Json<Grievance>> {
    let id = parse_id(&id)?;
    let status: GrievanceStatus = body.status.parse()?;
    Grievance::update_status(id, status, &state.pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Grievance not found"))
}

pub async fn api_delete_grievance(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let deleted = Grievance::delete(id, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Grievance not found or already deleted"))?;
    refresh_districts(&state.engine, state.refresh_on_write, &[deleted.district.as_str()]).await;
    Ok(StatusCode::NO_CONTENT)
}

// --- Disasters ---

pub async fn api_disasters(
    State(state): State<Arc<AppState>>,
    ApiQuery(filters): ApiQuery<DisasterFilters>,
) -> ApiResult<Json<Vec<Disaster>>> {
    Ok(Json(Disaster::list(&filters, &state.pool).await?))
}

pub async fn api_create_disaster(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewDisaster>,
) -> ApiResult<(StatusCode, Json<Disaster>)> {
    let disaster = Disaster::create(&body, &state.pool).await?;
    info!(id = %disaster.id, district = %disaster.district, "Disaster recorded");
    refresh_districts(&state.engine, state.refresh_on_write, &[disaster.district.as_str()]).await;
    Ok((StatusCode::CREATED, Json(disaster)))
}

pub async fn api_disaster(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Disaster>> {
    let id = parse_id(&id)?;
    Disaster::find_by_id(id, &state.pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Disaster not found"))
}

pub async fn api_update_disaster(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<DisasterUpdate>,
) -> ApiResult<Json<Disaster>> {
    let id = parse_id(&id)?;
    let updated = Disaster::update(id, &body, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Disaster not found"))?;
    info!(id = %id, district = %updated.record.district, "Disaster updated");
    refresh_districts(&state.engine, state.refresh_on_write, &updated.touched_districts()).await;
    Ok(Json(updated.record))
}

pub async fn api_delete_disaster(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let deleted = Disaster::delete(id, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Disaster not found or already deleted"))?;
    refresh_districts(&state.engine, state.refresh_on_write, &[deleted.district.as_str()]).await;
    Ok(StatusCode::NO_CONTENT)
}

// --- Policies ---

pub async fn api_policies(
    State(state): State<Arc<AppState>>,
    ApiQuery(filters): ApiQuery<PolicyFilters>,
) -> ApiResult<Json<Vec<Policy>>> {
    Ok(Json(Policy::list(&filters, &state.pool).await?))
}

pub async fn api_create_policy(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewPolicy>,
) -> ApiResult<(StatusCode, Json<Policy>)> {
    let policy = Policy::create(&body, &state.pool).await?;
    info!(id = %policy.id, district = %policy.district, "Policy recorded");
    refresh_districts(&state.engine, state.refresh_on_write, &[policy.district.as_str()]).await;
    Ok((StatusCode::CREATED, Json(policy)))
}

pub async fn api_policy(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<Json<Policy>> {
    let id = parse_id(&id)?;
    Policy::find_by_id(id, &state.pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Policy not found"))
}

pub async fn api_update_policy(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<PolicyUpdate>,
) -> ApiResult<Json<Policy>> {
    let id = parse_id(&id)?;
    let updated = Policy::update(id, &body, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Policy not found"))?;
    info!(id = %id, district = %updated.record.district, "Policy updated");
    refresh_districts(&state.engine, state.refresh_on_write, &updated.touched_districts()).await;
    Ok(Json(updated.record))
}

pub async fn api_policy_stats(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SectorStats>>> {
    Ok(Json(Policy::sector_stats(&state.pool).await?))
}

pub async fn api_delete_policy(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    let deleted = Policy::delete(id, &state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Policy not found or already deleted"))?;
    refresh_districts(&state.engine, state.refresh_on_write, &[deleted.district.as_str()]).await;
    Ok(StatusCode::NO_CONTENT)
}
