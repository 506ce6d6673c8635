use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::attachments::dtos::UploadedFile;
use crate::features::attachments::models::Attachment;
use crate::features::attachments::services::AttachmentService;
use crate::features::facilities::services::FacilityService;
use crate::features::reviews::dtos::{
    CreateReviewDto, ModerationCounts, ReviewResponseDto, UpdateReviewDto,
};
use crate::features::reviews::models::{Review, ReviewStatus};
use crate::features::users::services::UserService;
use crate::shared::types::PaginationQuery;

/// Keep the failure kind, prefix the message with the failing file's
/// 1-based position in the upload list
fn tag_file_error(index: usize, err: AppError) -> AppError {
    let position = index + 1;
    match err {
        AppError::InvalidFile(msg) => AppError::InvalidFile(format!("file {}: {}", position, msg)),
        AppError::Storage(msg) => AppError::Storage(format!("file {}: {}", position, msg)),
        other => other,
    }
}

/// Review lifecycle: submission, moderation, edits and deletion
///
/// Reviews move `pending -> approved | rejected` and never leave a
/// terminal state. Only approved reviews are publicly listed.
pub struct ReviewService {
    pool: SqlitePool,
    attachments: Arc<AttachmentService>,
    users: Arc<UserService>,
    facilities: Arc<FacilityService>,
}

impl ReviewService {
    pub fn new(
        pool: SqlitePool,
        attachments: Arc<AttachmentService>,
        users: Arc<UserService>,
        facilities: Arc<FacilityService>,
    ) -> Self {
        Self {
            pool,
            attachments,
            users,
            facilities,
        }
    }

    /// Submit a review in `pending` and attach any uploaded files
    ///
    /// A failed attach aborts the whole submission: files stored so far
    /// and the review row are removed before the error, tagged with the
    /// failing file's position, reaches the caller.
    pub async fn create(
        &self,
        dto: CreateReviewDto,
        files: Vec<UploadedFile>,
    ) -> Result<ReviewResponseDto> {
        dto.validate()?;

        self.users.get(dto.user_id).await?;
        self.facilities.get(dto.facility_id).await?;

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id: dto.user_id,
            facility_id: dto.facility_id,
            content: dto.content,
            rating: dto.rating,
            status: ReviewStatus::Pending,
            moderated_by: None,
            moderation_notes: None,
            moderated_at: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO reviews \
             (id, user_id, facility_id, content, rating, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.facility_id)
        .bind(&review.content)
        .bind(review.rating)
        .bind(review.status)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                AppError::Conflict("User has already reviewed this facility".to_string())
            }
            _ => {
                tracing::error!("Failed to insert review: {:?}", e);
                AppError::Database(e)
            }
        })?;

        let mut attached: Vec<Attachment> = Vec::new();
        for (index, file) in files.iter().filter(|f| !f.is_empty()).enumerate() {
            match self.attachments.attach(review.id, file).await {
                Ok(attachment) => attached.push(attachment),
                Err(e) => {
                    self.rollback_create(review.id, &attached).await;
                    return Err(tag_file_error(index, e));
                }
            }
        }

        tracing::info!(
            "Created review {} for facility {} by user {} with {} attachment(s)",
            review.id,
            review.facility_id,
            review.user_id,
            attached.len()
        );

        Ok(ReviewResponseDto::from_parts(review, attached))
    }

    /// Best-effort compensation when an attach fails mid-submission
    async fn rollback_create(&self, review_id: Uuid, attached: &[Attachment]) {
        for attachment in attached {
            if let Err(e) = self.attachments.remove(attachment.id).await {
                tracing::error!("Failed to roll back attachment {}: {}", attachment.id, e);
            }
        }
        if let Err(e) = sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await
        {
            tracing::error!("Failed to roll back review {}: {:?}", review_id, e);
        }
    }

    async fn fetch(&self, review_id: Uuid) -> Result<Review> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch review {}: {:?}", review_id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("Review not found with id: {}", review_id)))
    }

    pub async fn get(&self, review_id: Uuid) -> Result<ReviewResponseDto> {
        let review = self.fetch(review_id).await?;
        let attachments = self.attachments.list_for_review(review_id).await?;
        Ok(ReviewResponseDto::from_parts(review, attachments))
    }

    /// Approved reviews of a facility, newest first
    pub async fn list_for_facility(
        &self,
        facility_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ReviewResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE facility_id = ? AND status = ?",
        )
        .bind(facility_id)
        .bind(ReviewStatus::Approved)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count reviews for facility {}: {:?}", facility_id, e);
            AppError::Database(e)
        })?;

        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE facility_id = ? AND status = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(facility_id)
        .bind(ReviewStatus::Approved)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reviews for facility {}: {:?}", facility_id, e);
            AppError::Database(e)
        })?;

        Ok((self.with_attachments(reviews).await?, total))
    }

    /// Every review a user has written, any status, newest first
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ReviewResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count reviews for user {}: {:?}", user_id, e);
                AppError::Database(e)
            })?;

        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE user_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reviews for user {}: {:?}", user_id, e);
            AppError::Database(e)
        })?;

        Ok((self.with_attachments(reviews).await?, total))
    }

    /// Moderation queue, oldest submissions first
    pub async fn list_pending(
        &self,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<ReviewResponseDto>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE status = ?")
            .bind(ReviewStatus::Pending)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count pending reviews: {:?}", e);
                AppError::Database(e)
            })?;

        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE status = ? ORDER BY created_at ASC LIMIT ? OFFSET ?",
        )
        .bind(ReviewStatus::Pending)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list pending reviews: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((self.with_attachments(reviews).await?, total))
    }

    pub async fn approve(&self, review_id: Uuid, moderator_id: Uuid) -> Result<ReviewResponseDto> {
        self.moderate(review_id, moderator_id, ReviewStatus::Approved, None)
            .await
    }

    pub async fn reject(
        &self,
        review_id: Uuid,
        moderator_id: Uuid,
        notes: Option<String>,
    ) -> Result<ReviewResponseDto> {
        self.moderate(review_id, moderator_id, ReviewStatus::Rejected, notes)
            .await
    }

    /// Apply a moderation decision
    ///
    /// The UPDATE is guarded on `status = 'pending'` so concurrent
    /// decisions admit exactly one winner; the loser gets a conflict.
    async fn moderate(
        &self,
        review_id: Uuid,
        moderator_id: Uuid,
        decision: ReviewStatus,
        notes: Option<String>,
    ) -> Result<ReviewResponseDto> {
        if !self.users.is_admin(moderator_id).await? {
            return Err(AppError::Forbidden(
                "Only admins can moderate reviews".to_string(),
            ));
        }

        let review = self.fetch(review_id).await?;
        if review.status != ReviewStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Review is already {}",
                review.status
            )));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE reviews \
             SET status = ?, moderated_by = ?, moderation_notes = ?, moderated_at = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(decision)
        .bind(moderator_id)
        .bind(&notes)
        .bind(now)
        .bind(now)
        .bind(review_id)
        .bind(ReviewStatus::Pending)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to moderate review {}: {:?}", review_id, e);
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            // Lost the race to another moderator
            return Err(AppError::Conflict(
                "Review is no longer pending".to_string(),
            ));
        }

        tracing::info!(
            "Review {} {} by moderator {}",
            review_id,
            decision,
            moderator_id
        );
        self.get(review_id).await
    }

    /// Edit a pending review; owner only, admins get no exception here
    pub async fn update(
        &self,
        review_id: Uuid,
        dto: UpdateReviewDto,
    ) -> Result<ReviewResponseDto> {
        dto.validate()?;

        let review = self.fetch(review_id).await?;
        if review.user_id != dto.user_id {
            return Err(AppError::Forbidden(
                "Only the review owner can edit it".to_string(),
            ));
        }
        if review.status != ReviewStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Review is already {}",
                review.status
            )));
        }

        let result = sqlx::query(
            "UPDATE reviews SET content = ?, rating = ?, updated_at = ? \
             WHERE id = ? AND status = ?",
        )
        .bind(&dto.content)
        .bind(dto.rating)
        .bind(Utc::now())
        .bind(review_id)
        .bind(ReviewStatus::Pending)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update review {}: {:?}", review_id, e);
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Review is no longer pending".to_string(),
            ));
        }

        self.get(review_id).await
    }

    /// Delete a review and all of its attachments
    ///
    /// Owners and admins may delete. Attachments go first so a partial
    /// failure never leaves metadata pointing at a missing review.
    pub async fn delete(&self, review_id: Uuid, requester_id: Uuid) -> Result<()> {
        let review = self.fetch(review_id).await?;

        if review.user_id != requester_id && !self.users.is_admin(requester_id).await? {
            return Err(AppError::Forbidden(
                "Only the review owner or an admin can delete it".to_string(),
            ));
        }

        let attachments = self.attachments.list_for_review(review_id).await?;
        for attachment in &attachments {
            self.attachments.remove(attachment.id).await?;
        }

        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(review_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete review {}: {:?}", review_id, e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Deleted review {} and {} attachment(s), requested by {}",
            review_id,
            attachments.len(),
            requester_id
        );
        Ok(())
    }

    /// One review per (user, facility), regardless of status
    ///
    /// Advisory check for clients; the unique index on the table is the
    /// hard guarantee.
    pub async fn can_review(&self, user_id: Uuid, facility_id: Uuid) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reviews WHERE user_id = ? AND facility_id = ?",
        )
        .bind(user_id)
        .bind(facility_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed eligibility check for user {} and facility {}: {:?}",
                user_id,
                facility_id,
                e
            );
            AppError::Database(e)
        })?;

        Ok(count == 0)
    }

    /// Per-status counts, for the admin dashboard
    pub async fn moderation_counts(&self) -> Result<ModerationCounts> {
        let rows: Vec<(ReviewStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM reviews GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to count reviews by status: {:?}", e);
                    AppError::Database(e)
                })?;

        let mut counts = ModerationCounts::default();
        for (status, count) in rows {
            match status {
                ReviewStatus::Pending => counts.pending = count,
                ReviewStatus::Approved => counts.approved = count,
                ReviewStatus::Rejected => counts.rejected = count,
            }
        }
        Ok(counts)
    }

    async fn with_attachments(&self, reviews: Vec<Review>) -> Result<Vec<ReviewResponseDto>> {
        let mut out = Vec::with_capacity(reviews.len());
        for review in reviews {
            let attachments = self.attachments.list_for_review(review.id).await?;
            out.push(ReviewResponseDto::from_parts(review, attachments));
        }
        Ok(out)
    }
}
