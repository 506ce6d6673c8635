use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Counters shown on the admin dashboard
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponseDto {
    pub pending_reviews: i64,
    pub approved_reviews: i64,
    pub rejected_reviews: i64,
    pub total_attachments: i64,
    pub total_storage_bytes: i64,
}
