use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::stats::handlers::get_facility_statistics;
use crate::features::stats::services::StatsService;

/// Create routes for facility statistics
pub fn routes(stats_service: Arc<StatsService>) -> Router {
    Router::new()
        .route(
            "/api/facilities/{facility_id}/statistics",
            get(get_facility_statistics),
        )
        .with_state(stats_service)
}
