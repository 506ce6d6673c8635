use utoipa::{Modify, OpenApi};

use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::attachments::{dtos as attachments_dtos, handlers as attachments_handlers};
use crate::features::reviews::{
    dtos as reviews_dtos, handlers as reviews_handlers, models as reviews_models,
};
use crate::features::stats::{dtos as stats_dtos, handlers as stats_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Reviews
        reviews_handlers::create_review,
        reviews_handlers::get_review,
        reviews_handlers::list_facility_reviews,
        reviews_handlers::list_user_reviews,
        reviews_handlers::check_eligibility,
        reviews_handlers::update_review,
        reviews_handlers::delete_review,
        // Files
        attachments_handlers::serve_attachment,
        attachments_handlers::download_attachment,
        attachments_handlers::list_review_attachments,
        attachments_handlers::list_user_attachments,
        attachments_handlers::list_facility_attachments,
        // Statistics
        stats_handlers::get_facility_statistics,
        // Admin
        admin_handlers::list_pending_reviews,
        admin_handlers::approve_review,
        admin_handlers::reject_review,
        admin_handlers::reconcile_attachments,
        admin_handlers::verify_attachment,
        admin_handlers::dashboard,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Reviews
            reviews_models::ReviewStatus,
            reviews_dtos::CreateReviewFormDto,
            reviews_dtos::UpdateReviewDto,
            reviews_dtos::ApproveReviewDto,
            reviews_dtos::RejectReviewDto,
            reviews_dtos::EligibilityResponseDto,
            reviews_dtos::ReviewResponseDto,
            ApiResponse<reviews_dtos::ReviewResponseDto>,
            ApiResponse<Vec<reviews_dtos::ReviewResponseDto>>,
            ApiResponse<reviews_dtos::EligibilityResponseDto>,
            // Attachments
            attachments_dtos::AttachmentResponseDto,
            attachments_dtos::ReconcileResponseDto,
            attachments_dtos::IntegrityResponseDto,
            ApiResponse<Vec<attachments_dtos::AttachmentResponseDto>>,
            ApiResponse<attachments_dtos::ReconcileResponseDto>,
            ApiResponse<attachments_dtos::IntegrityResponseDto>,
            // Statistics
            stats_dtos::FacilityRatingSummary,
            ApiResponse<stats_dtos::FacilityRatingSummary>,
            // Admin
            admin_dtos::DashboardResponseDto,
            ApiResponse<admin_dtos::DashboardResponseDto>,
        )
    ),
    tags(
        (name = "reviews", description = "Review submission and lifecycle"),
        (name = "files", description = "Attachment downloads and listings"),
        (name = "statistics", description = "Facility rating statistics"),
        (name = "admin", description = "Moderation queue and maintenance"),
    ),
    info(
        title = "Yorum API",
        version = "0.1.0",
        description = "Facility review moderation and attachment storage",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
