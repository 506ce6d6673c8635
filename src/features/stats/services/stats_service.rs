use std::collections::BTreeMap;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::reviews::models::ReviewStatus;
use crate::features::stats::dtos::FacilityRatingSummary;

/// On-demand rating aggregation over approved reviews
pub struct StatsService {
    pool: SqlitePool,
}

impl StatsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mean approved rating for one facility, 0.0 when there are none
    pub async fn average_rating(&self, facility_id: Uuid) -> Result<f64> {
        let average: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(rating) FROM reviews WHERE facility_id = ? AND status = ?",
        )
        .bind(facility_id)
        .bind(ReviewStatus::Approved)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to compute average rating for facility {}: {:?}",
                facility_id,
                e
            );
            AppError::Database(e)
        })?;

        Ok(average.unwrap_or(0.0))
    }

    /// Count, mean and histogram from a single grouped read, so all three
    /// numbers describe the same snapshot
    pub async fn summary(&self, facility_id: Uuid) -> Result<FacilityRatingSummary> {
        let rows: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT rating, COUNT(*) FROM reviews \
             WHERE facility_id = ? AND status = ? GROUP BY rating",
        )
        .bind(facility_id)
        .bind(ReviewStatus::Approved)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to compute rating summary for facility {}: {:?}",
                facility_id,
                e
            );
            AppError::Database(e)
        })?;

        let mut histogram: BTreeMap<u8, i64> = (1..=5u8).map(|rating| (rating, 0)).collect();
        let mut total = 0i64;
        let mut weighted = 0i64;
        for (rating, count) in rows {
            if let Some(slot) = histogram.get_mut(&(rating as u8)) {
                *slot = count;
            }
            total += count;
            weighted += i64::from(rating) * count;
        }

        let average = if total == 0 {
            0.0
        } else {
            weighted as f64 / total as f64
        };

        Ok(FacilityRatingSummary {
            facility_id,
            total,
            average,
            histogram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reviews::dtos::CreateReviewDto;
    use crate::shared::test_helpers::test_context;

    async fn seed_rated_reviews(
        ctx: &crate::shared::test_helpers::TestContext,
        facility_id: Uuid,
        approved: &[i32],
        pending: &[i32],
    ) {
        let admin_id = ctx.seed_admin().await;
        for &rating in approved {
            let user_id = ctx.seed_user().await;
            let review = ctx
                .reviews
                .create(
                    CreateReviewDto {
                        user_id,
                        facility_id,
                        content: "Detailed enough to pass validation.".to_string(),
                        rating,
                    },
                    Vec::new(),
                )
                .await
                .unwrap();
            ctx.reviews.approve(review.id, admin_id).await.unwrap();
        }
        for &rating in pending {
            let user_id = ctx.seed_user().await;
            ctx.reviews
                .create(
                    CreateReviewDto {
                        user_id,
                        facility_id,
                        content: "Detailed enough to pass validation.".to_string(),
                        rating,
                    },
                    Vec::new(),
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_summary_counts_only_approved_reviews() {
        let ctx = test_context().await;
        let facility_id = ctx.seed_facility().await;

        seed_rated_reviews(&ctx, facility_id, &[5, 3], &[1]).await;

        let summary = ctx.stats.summary(facility_id).await.unwrap();
        assert_eq!(summary.total, 2);
        assert!((summary.average - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.histogram[&5], 1);
        assert_eq!(summary.histogram[&3], 1);
        assert_eq!(summary.histogram[&1], 0);
        assert_eq!(summary.histogram.len(), 5);
    }

    #[tokio::test]
    async fn test_averages_default_to_zero_without_approved_reviews() {
        let ctx = test_context().await;
        let facility_id = ctx.seed_facility().await;

        assert_eq!(ctx.stats.average_rating(facility_id).await.unwrap(), 0.0);

        seed_rated_reviews(&ctx, facility_id, &[], &[4]).await;
        assert_eq!(ctx.stats.average_rating(facility_id).await.unwrap(), 0.0);

        let summary = ctx.stats.summary(facility_id).await.unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.average, 0.0);
    }

    #[tokio::test]
    async fn test_average_follows_moderation_decisions() {
        let ctx = test_context().await;
        let facility_id = ctx.seed_facility().await;

        seed_rated_reviews(&ctx, facility_id, &[2, 4, 4], &[]).await;

        let average = ctx.stats.average_rating(facility_id).await.unwrap();
        assert!((average - 10.0 / 3.0).abs() < 1e-9);
    }
}
