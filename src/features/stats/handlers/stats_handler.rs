use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::stats::dtos::FacilityRatingSummary;
use crate::features::stats::services::StatsService;
use crate::shared::types::ApiResponse;

/// Rating statistics over a facility's approved reviews
#[utoipa::path(
    get,
    path = "/api/facilities/{facility_id}/statistics",
    tag = "statistics",
    params(
        ("facility_id" = Uuid, Path, description = "Facility ID")
    ),
    responses(
        (status = 200, description = "Rating summary", body = ApiResponse<FacilityRatingSummary>)
    )
)]
pub async fn get_facility_statistics(
    State(service): State<Arc<StatsService>>,
    Path(facility_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<FacilityRatingSummary>>), AppError> {
    let summary = service.summary(facility_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(Some(summary), None, None)),
    ))
}
