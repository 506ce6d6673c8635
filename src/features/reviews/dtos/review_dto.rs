use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::attachments::dtos::AttachmentResponseDto;
use crate::features::attachments::models::Attachment;
use crate::features::reviews::models::{Review, ReviewStatus};

/// Fields of the review creation form (text parts of the multipart body)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReviewDto {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "content must be between 10 and 1000 characters"
    ))]
    pub content: String,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
}

/// Request DTO for editing a pending review
///
/// `user_id` identifies the caller; only the owner may edit, and only
/// while the review is pending.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReviewDto {
    pub user_id: Uuid,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "content must be between 10 and 1000 characters"
    ))]
    pub content: String,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
}

/// Request DTO for approving a pending review
#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveReviewDto {
    pub moderator_id: Uuid,
}

/// Request DTO for rejecting a pending review
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectReviewDto {
    pub moderator_id: Uuid,
    #[validate(length(max = 1000, message = "notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Query parameters for the eligibility check
#[derive(Debug, Deserialize, IntoParams)]
pub struct EligibilityQuery {
    pub user_id: Uuid,
    pub facility_id: Uuid,
}

/// Response DTO for the eligibility check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EligibilityResponseDto {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub can_review: bool,
}

/// Query parameters identifying who asked for a deletion
#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteReviewQuery {
    pub requester_id: Uuid,
}

/// Response DTO for reviews, attachments included
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub content: String,
    pub rating: i32,
    pub status: ReviewStatus,
    pub moderated_by: Option<Uuid>,
    pub moderation_notes: Option<String>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentResponseDto>,
}

impl ReviewResponseDto {
    pub fn from_parts(review: Review, attachments: Vec<Attachment>) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            facility_id: review.facility_id,
            content: review.content,
            rating: review.rating,
            status: review.status,
            moderated_by: review.moderated_by,
            moderation_notes: review.moderation_notes,
            moderated_at: review.moderated_at,
            created_at: review.created_at,
            updated_at: review.updated_at,
            attachments: attachments
                .into_iter()
                .map(AttachmentResponseDto::from)
                .collect(),
        }
    }
}

/// Per-status review counts, consumed by the admin dashboard
#[derive(Debug, Clone, Copy, Default)]
pub struct ModerationCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

/// Shape of the review creation form, for OpenAPI documentation only;
/// the handler reads the multipart body directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateReviewFormDto {
    pub user_id: Uuid,
    pub facility_id: Uuid,
    pub content: String,
    pub rating: i32,
    /// Image files (jpg, jpeg or png, up to 10 MiB each); field repeats
    #[schema(value_type = String, format = Binary)]
    pub files: Option<String>,
}
