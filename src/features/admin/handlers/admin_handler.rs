use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::admin::dtos::DashboardResponseDto;
use crate::features::attachments::dtos::{IntegrityResponseDto, ReconcileResponseDto};
use crate::features::attachments::services::AttachmentService;
use crate::features::reviews::dtos::{ApproveReviewDto, RejectReviewDto, ReviewResponseDto};
use crate::features::reviews::services::ReviewService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Shared state for admin handlers, which cut across reviews and
/// attachments
#[derive(Clone)]
pub struct AdminState {
    pub review_service: Arc<ReviewService>,
    pub attachment_service: Arc<AttachmentService>,
}

/// List the moderation queue, oldest first (paginated)
#[utoipa::path(
    get,
    path = "/api/admin/reviews/pending",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Pending reviews awaiting moderation", body = ApiResponse<Vec<ReviewResponseDto>>)
    ),
    tag = "admin"
)]
pub async fn list_pending_reviews(
    State(state): State<AdminState>,
    Query(params): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewResponseDto>>>> {
    let (reviews, total) = state.review_service.list_pending(&params).await?;

    Ok(Json(ApiResponse::success(
        Some(reviews),
        None,
        Some(Meta { total }),
    )))
}

/// Approve a pending review
#[utoipa::path(
    post,
    path = "/api/admin/reviews/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    request_body = ApproveReviewDto,
    responses(
        (status = 200, description = "Review approved", body = ApiResponse<ReviewResponseDto>),
        (status = 403, description = "Moderator is not an admin"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Review already moderated")
    ),
    tag = "admin"
)]
pub async fn approve_review(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ApproveReviewDto>,
) -> Result<Json<ApiResponse<ReviewResponseDto>>> {
    let review = state.review_service.approve(id, dto.moderator_id).await?;

    Ok(Json(ApiResponse::success(
        Some(review),
        Some("Review approved".to_string()),
        None,
    )))
}

/// Reject a pending review, optionally with notes for the author
#[utoipa::path(
    post,
    path = "/api/admin/reviews/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    request_body = RejectReviewDto,
    responses(
        (status = 200, description = "Review rejected", body = ApiResponse<ReviewResponseDto>),
        (status = 403, description = "Moderator is not an admin"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Review already moderated")
    ),
    tag = "admin"
)]
pub async fn reject_review(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<RejectReviewDto>,
) -> Result<Json<ApiResponse<ReviewResponseDto>>> {
    dto.validate()?;
    let review = state
        .review_service
        .reject(id, dto.moderator_id, dto.notes)
        .await?;

    Ok(Json(ApiResponse::success(
        Some(review),
        Some("Review rejected".to_string()),
        None,
    )))
}

/// Remove attachment metadata whose review no longer exists
#[utoipa::path(
    post,
    path = "/api/admin/attachments/reconcile",
    responses(
        (status = 200, description = "Sweep finished", body = ApiResponse<ReconcileResponseDto>)
    ),
    tag = "admin"
)]
pub async fn reconcile_attachments(
    State(state): State<AdminState>,
) -> Result<Json<ApiResponse<ReconcileResponseDto>>> {
    let removed = state.attachment_service.reconcile().await?;

    Ok(Json(ApiResponse::success(
        Some(ReconcileResponseDto { removed }),
        Some("Attachment reconciliation finished".to_string()),
        None,
    )))
}

/// Check that an attachment's stored file is still on disk
#[utoipa::path(
    get,
    path = "/api/admin/attachments/{id}/verify",
    params(
        ("id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Integrity verdict", body = ApiResponse<IntegrityResponseDto>),
        (status = 404, description = "Attachment not found")
    ),
    tag = "admin"
)]
pub async fn verify_attachment(
    State(state): State<AdminState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<IntegrityResponseDto>>> {
    let valid = state.attachment_service.validate_integrity(id).await?;

    Ok(Json(ApiResponse::success(
        Some(IntegrityResponseDto {
            attachment_id: id,
            valid,
        }),
        None,
        None,
    )))
}

/// Moderation and storage counters
#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard counters", body = ApiResponse<DashboardResponseDto>)
    ),
    tag = "admin"
)]
pub async fn dashboard(
    State(state): State<AdminState>,
) -> Result<Json<ApiResponse<DashboardResponseDto>>> {
    let counts = state.review_service.moderation_counts().await?;
    let (total_attachments, total_storage_bytes) =
        state.attachment_service.storage_totals().await?;

    Ok(Json(ApiResponse::success(
        Some(DashboardResponseDto {
            pending_reviews: counts.pending,
            approved_reviews: counts.approved,
            rejected_reviews: counts.rejected,
            total_attachments,
            total_storage_bytes,
        }),
        None,
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reviews::models::ReviewStatus;
    use crate::shared::test_helpers::test_context;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::json;

    async fn submit_review(
        server: &TestServer,
        user_id: Uuid,
        facility_id: Uuid,
        with_file: bool,
    ) -> ReviewResponseDto {
        let mut form = MultipartForm::new()
            .add_text("user_id", user_id.to_string())
            .add_text("facility_id", facility_id.to_string())
            .add_text("content", "Good lighting and well kept grounds.")
            .add_text("rating", "4");
        if with_file {
            form = form.add_part(
                "files",
                Part::bytes(vec![3u8; 48])
                    .file_name("grounds.jpg")
                    .mime_type("image/jpeg"),
            );
        }

        let response = server.post("/api/reviews").multipart(form).await;
        response.assert_status(StatusCode::CREATED);
        response
            .json::<ApiResponse<ReviewResponseDto>>()
            .data
            .unwrap()
    }

    #[tokio::test]
    async fn test_moderation_flow_over_http() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let admin_id = ctx.seed_admin().await;
        let facility_id = ctx.seed_facility().await;

        let first = submit_review(&server, ctx.seed_user().await, facility_id, false).await;
        let second = submit_review(&server, ctx.seed_user().await, facility_id, false).await;

        let pending = server.get("/api/admin/reviews/pending").await;
        pending.assert_status_ok();
        let body: ApiResponse<Vec<ReviewResponseDto>> = pending.json();
        assert_eq!(body.meta.unwrap().total, 2);

        let approved = server
            .post(&format!("/api/admin/reviews/{}/approve", first.id))
            .json(&json!({ "moderator_id": admin_id }))
            .await;
        approved.assert_status_ok();
        let body: ApiResponse<ReviewResponseDto> = approved.json();
        assert_eq!(body.data.unwrap().status, ReviewStatus::Approved);

        let rejected = server
            .post(&format!("/api/admin/reviews/{}/reject", second.id))
            .json(&json!({ "moderator_id": admin_id, "notes": "duplicate photos" }))
            .await;
        rejected.assert_status_ok();
        let body: ApiResponse<ReviewResponseDto> = rejected.json();
        let review = body.data.unwrap();
        assert_eq!(review.status, ReviewStatus::Rejected);
        assert_eq!(review.moderation_notes.as_deref(), Some("duplicate photos"));

        // Second decision on the same review conflicts
        let again = server
            .post(&format!("/api/admin/reviews/{}/approve", second.id))
            .json(&json!({ "moderator_id": admin_id }))
            .await;
        again.assert_status(StatusCode::CONFLICT);

        // Non-admin moderators are turned away
        let outsider = ctx.seed_user().await;
        let forbidden = server
            .post(&format!("/api/admin/reviews/{}/approve", first.id))
            .json(&json!({ "moderator_id": outsider }))
            .await;
        forbidden.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reconcile_verify_and_dashboard_over_http() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let facility_id = ctx.seed_facility().await;

        let review = submit_review(&server, ctx.seed_user().await, facility_id, true).await;
        let attachment_id = review.attachments[0].id;

        let verify = server
            .get(&format!("/api/admin/attachments/{}/verify", attachment_id))
            .await;
        verify.assert_status_ok();
        let body: ApiResponse<IntegrityResponseDto> = verify.json();
        assert!(body.data.unwrap().valid);

        let dashboard = server.get("/api/admin/dashboard").await;
        dashboard.assert_status_ok();
        let body: ApiResponse<DashboardResponseDto> = dashboard.json();
        let counters = body.data.unwrap();
        assert_eq!(counters.pending_reviews, 1);
        assert_eq!(counters.total_attachments, 1);
        assert_eq!(counters.total_storage_bytes, 48);

        // Orphan the attachment, then sweep it up
        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review.id)
            .execute(&ctx.pool)
            .await
            .unwrap();

        let reconcile = server.post("/api/admin/attachments/reconcile").await;
        reconcile.assert_status_ok();
        let body: ApiResponse<ReconcileResponseDto> = reconcile.json();
        assert_eq!(body.data.unwrap().removed, 1);

        let verify = server
            .get(&format!("/api/admin/attachments/{}/verify", attachment_id))
            .await;
        verify.assert_status(StatusCode::NOT_FOUND);
    }
}
