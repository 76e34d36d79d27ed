use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::extract::JsonBody;
use crate::error::{AppError, Result};
use crate::models::{NewPackage, OptimizationUpdate, PackageInfo, PackageStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListDeliveriesParams {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(deserialize_with = "crate::models::delivery::lenient_status")]
    pub status: PackageStatus,
    #[serde(default)]
    pub optimized_order: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct OptimizationRequest {
    pub updates: Vec<OptimizationUpdate>,
}

#[derive(Debug, Serialize)]
pub struct DeleteDeliveryResponse {
    pub success: bool,
}

fn validate_package(package: &NewPackage) -> Result<()> {
    if package.user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("userId is required".to_string()));
    }
    if package.full_address.trim().is_empty() {
        return Err(AppError::InvalidInput("fullAddress is required".to_string()));
    }
    Ok(())
}

/// List an owner's deliveries, newest first
///
/// GET /api/deliveries?userId=<id>
pub async fn list_deliveries(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListDeliveriesParams>, QueryRejection>,
) -> Result<Json<Vec<PackageInfo>>> {
    let Query(params) = params?;
    if params.user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("userId is required".to_string()));
    }

    let packages = state.deliveries.list_by_owner(&params.user_id).await?;
    Ok(Json(packages))
}

/// POST /api/deliveries
pub async fn create_delivery(
    State(state): State<AppState>,
    JsonBody(package): JsonBody<NewPackage>,
) -> Result<(StatusCode, Json<PackageInfo>)> {
    validate_package(&package)?;

    let created = state.deliveries.create(package).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/deliveries/batch
pub async fn create_deliveries(
    State(state): State<AppState>,
    JsonBody(packages): JsonBody<Vec<NewPackage>>,
) -> Result<(StatusCode, Json<Vec<PackageInfo>>)> {
    packages.iter().try_for_each(validate_package)?;

    let created = state.deliveries.create_many(packages).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/deliveries/:id/status
pub async fn update_delivery_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateStatusRequest>,
) -> Result<Json<PackageInfo>> {
    let updated = state
        .deliveries
        .update_status(&id, request.status, request.optimized_order)
        .await?;
    Ok(Json(updated))
}

/// Apply route optimization results
///
/// Records that fail to update are skipped; the response lists only the
/// deliveries that were updated.
///
/// POST /api/deliveries/optimization
pub async fn optimize_deliveries(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<OptimizationRequest>,
) -> Json<Vec<PackageInfo>> {
    Json(
        state
            .deliveries
            .bulk_update_optimization(request.updates)
            .await,
    )
}

/// DELETE /api/deliveries/:id
pub async fn delete_delivery(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteDeliveryResponse>> {
    let success = state.deliveries.delete(&id).await?;
    Ok(Json(DeleteDeliveryResponse { success }))
}
