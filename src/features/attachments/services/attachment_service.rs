use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::attachments::dtos::UploadedFile;
use crate::features::attachments::models::Attachment;
use crate::modules::storage::DiskStorage;

/// Registry binding stored files to review metadata
///
/// Physical bytes live in [`DiskStorage`]; this service owns the metadata
/// rows and keeps the two sides consistent across partial failures.
pub struct AttachmentService {
    pool: SqlitePool,
    storage: Arc<DiskStorage>,
}

impl AttachmentService {
    pub fn new(pool: SqlitePool, storage: Arc<DiskStorage>) -> Self {
        Self { pool, storage }
    }

    /// Store a file and record its metadata against a review
    ///
    /// The file is written to disk first; if the metadata insert then
    /// fails, the stored file is removed before the error surfaces so a
    /// failed attach leaves nothing behind.
    pub async fn attach(&self, review_id: Uuid, upload: &UploadedFile) -> Result<Attachment> {
        let stored = self
            .storage
            .store(&upload.data, &upload.content_type, &upload.file_name)
            .await?;

        let attachment = Attachment {
            id: Uuid::new_v4(),
            review_id,
            original_filename: upload.file_name.clone(),
            stored_filename: stored.stored_filename,
            file_path: stored.file_path,
            content_type: upload.content_type.clone(),
            file_size: stored.file_size,
            created_at: Utc::now(),
        };

        let inserted = sqlx::query(
            "INSERT INTO attachments \
             (id, review_id, original_filename, stored_filename, file_path, content_type, file_size, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(attachment.id)
        .bind(attachment.review_id)
        .bind(&attachment.original_filename)
        .bind(&attachment.stored_filename)
        .bind(&attachment.file_path)
        .bind(&attachment.content_type)
        .bind(attachment.file_size)
        .bind(attachment.created_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            // Compensate: the stored file must not outlive a failed insert
            if let Err(cleanup) = self.storage.delete(&attachment.stored_filename).await {
                tracing::error!(
                    "Failed to remove stored file '{}' after insert failure: {}",
                    attachment.stored_filename,
                    cleanup
                );
            }
            tracing::error!("Failed to insert attachment metadata: {:?}", e);
            return Err(AppError::Database(e));
        }

        tracing::info!(
            "Attached '{}' to review {} as '{}'",
            attachment.original_filename,
            review_id,
            attachment.stored_filename
        );

        Ok(attachment)
    }

    pub async fn get(&self, attachment_id: Uuid) -> Result<Attachment> {
        sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = ?")
            .bind(attachment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch attachment {}: {:?}", attachment_id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attachment not found with id: {}", attachment_id))
            })
    }

    pub async fn get_by_stored_name(&self, stored_name: &str) -> Result<Attachment> {
        sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE stored_filename = ?")
            .bind(stored_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch attachment '{}': {:?}", stored_name, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| {
                AppError::NotFound(format!("Attachment not found: {}", stored_name))
            })
    }

    /// Metadata plus file bytes, for download endpoints
    pub async fn download(&self, stored_name: &str) -> Result<(Attachment, Vec<u8>)> {
        let attachment = self.get_by_stored_name(stored_name).await?;
        let bytes = self.storage.load(&attachment.stored_filename).await?;
        Ok((attachment, bytes))
    }

    /// Attachments of one review, oldest first
    pub async fn list_for_review(&self, review_id: Uuid) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(
            "SELECT * FROM attachments WHERE review_id = ? ORDER BY created_at ASC",
        )
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list attachments for review {}: {:?}", review_id, e);
            AppError::Database(e)
        })
    }

    /// Attachments across all reviews written by one user, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(
            "SELECT a.* FROM attachments a \
             JOIN reviews r ON a.review_id = r.id \
             WHERE r.user_id = ? \
             ORDER BY a.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list attachments for user {}: {:?}", user_id, e);
            AppError::Database(e)
        })
    }

    /// Attachments across all reviews of one facility, newest first
    pub async fn list_for_facility(&self, facility_id: Uuid) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(
            "SELECT a.* FROM attachments a \
             JOIN reviews r ON a.review_id = r.id \
             WHERE r.facility_id = ? \
             ORDER BY a.created_at DESC",
        )
        .bind(facility_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to list attachments for facility {}: {:?}",
                facility_id,
                e
            );
            AppError::Database(e)
        })
    }

    /// Remove one attachment, physical file first, then metadata
    ///
    /// An already-missing file is logged and tolerated; the metadata row
    /// is removed either way.
    pub async fn remove(&self, attachment_id: Uuid) -> Result<()> {
        let attachment = self.get(attachment_id).await?;

        let removed = self.storage.delete(&attachment.stored_filename).await?;
        if !removed {
            tracing::warn!(
                "Stored file '{}' was already absent while removing attachment {}",
                attachment.stored_filename,
                attachment_id
            );
        }

        sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(attachment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete attachment {}: {:?}", attachment_id, e);
                AppError::Database(e)
            })?;

        tracing::info!(
            "Removed attachment {} ('{}')",
            attachment_id,
            attachment.stored_filename
        );
        Ok(())
    }

    /// Sweep metadata rows whose owning review no longer exists
    ///
    /// Returns how many orphans were removed. Rows already gone when the
    /// sweep reaches them are skipped without counting.
    pub async fn reconcile(&self) -> Result<u64> {
        let orphans = sqlx::query_as::<_, Attachment>(
            "SELECT a.* FROM attachments a \
             LEFT JOIN reviews r ON a.review_id = r.id \
             WHERE r.id IS NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to query orphaned attachments: {:?}", e);
            AppError::Database(e)
        })?;

        let mut removed = 0u64;
        for orphan in orphans {
            match self.remove(orphan.id).await {
                Ok(()) => removed += 1,
                // A concurrent sweep already took this one
                Err(AppError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        if removed > 0 {
            tracing::info!("Reconciliation removed {} orphaned attachment(s)", removed);
        }
        Ok(removed)
    }

    /// True when the metadata row's stored file is present on disk
    pub async fn validate_integrity(&self, attachment_id: Uuid) -> Result<bool> {
        let attachment = self.get(attachment_id).await?;
        Ok(self.storage.exists(&attachment.stored_filename).await)
    }

    /// Attachment count and summed byte size, for the admin dashboard
    pub async fn storage_totals(&self) -> Result<(i64, i64)> {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(file_size), 0) FROM attachments",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to compute storage totals: {:?}", e);
            AppError::Database(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        memory_pool, png_upload, seed_facility, seed_review, seed_user, temp_storage,
    };

    async fn service_with_dirs() -> (AttachmentService, tempfile::TempDir, SqlitePool) {
        let pool = memory_pool().await;
        let (storage, dir) = temp_storage().await;
        let service = AttachmentService::new(pool.clone(), Arc::new(storage));
        (service, dir, pool)
    }

    async fn seeded_review(pool: &SqlitePool) -> Uuid {
        let user_id = seed_user(pool).await;
        let facility_id = seed_facility(pool).await;
        seed_review(pool, user_id, facility_id).await
    }

    #[tokio::test]
    async fn test_attach_persists_file_and_metadata() {
        let (service, dir, pool) = service_with_dirs().await;
        let review_id = seeded_review(&pool).await;

        let upload = png_upload("garden.png", 2048);
        let attachment = service.attach(review_id, &upload).await.unwrap();

        assert_eq!(attachment.review_id, review_id);
        assert_eq!(attachment.original_filename, "garden.png");
        assert_eq!(attachment.file_size, 2048);

        let on_disk = dir.path().join(&attachment.stored_filename);
        assert!(on_disk.exists());

        let fetched = service.get(attachment.id).await.unwrap();
        assert_eq!(fetched.stored_filename, attachment.stored_filename);
    }

    #[tokio::test]
    async fn test_attach_removes_stored_file_when_insert_fails() {
        let (service, dir, pool) = service_with_dirs().await;
        let review_id = seeded_review(&pool).await;

        sqlx::query("DROP TABLE attachments")
            .execute(&pool)
            .await
            .unwrap();

        let upload = png_upload("lost.png", 512);
        let err = service.attach(review_id, &upload).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        // The compensating delete must leave the storage root empty
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_remove_deletes_file_and_metadata() {
        let (service, dir, pool) = service_with_dirs().await;
        let review_id = seeded_review(&pool).await;

        let attachment = service
            .attach(review_id, &png_upload("a.png", 100))
            .await
            .unwrap();

        service.remove(attachment.id).await.unwrap();

        assert!(!dir.path().join(&attachment.stored_filename).exists());
        let err = service.get(attachment.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_tolerates_missing_physical_file() {
        let (service, dir, pool) = service_with_dirs().await;
        let review_id = seeded_review(&pool).await;

        let attachment = service
            .attach(review_id, &png_upload("gone.png", 100))
            .await
            .unwrap();

        std::fs::remove_file(dir.path().join(&attachment.stored_filename)).unwrap();

        service.remove(attachment.id).await.unwrap();
        let err = service.get(attachment.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reconcile_removes_only_orphans() {
        let (service, dir, pool) = service_with_dirs().await;
        let kept_review = seeded_review(&pool).await;
        let doomed_review = seeded_review(&pool).await;

        let kept = service
            .attach(kept_review, &png_upload("kept.png", 100))
            .await
            .unwrap();
        let orphan = service
            .attach(doomed_review, &png_upload("orphan.png", 100))
            .await
            .unwrap();

        // Delete the review out from under its attachment
        sqlx::query("DELETE FROM reviews WHERE id = ?")
            .bind(doomed_review)
            .execute(&pool)
            .await
            .unwrap();

        assert_eq!(service.reconcile().await.unwrap(), 1);
        assert!(!dir.path().join(&orphan.stored_filename).exists());
        assert!(dir.path().join(&kept.stored_filename).exists());

        // A second sweep finds nothing
        assert_eq!(service.reconcile().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_validate_integrity_detects_drift() {
        let (service, dir, pool) = service_with_dirs().await;
        let review_id = seeded_review(&pool).await;

        let attachment = service
            .attach(review_id, &png_upload("check.png", 100))
            .await
            .unwrap();
        assert!(service.validate_integrity(attachment.id).await.unwrap());

        std::fs::remove_file(dir.path().join(&attachment.stored_filename)).unwrap();
        assert!(!service.validate_integrity(attachment.id).await.unwrap());

        let err = service.validate_integrity(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_listings_follow_review_ownership() {
        let (service, _dir, pool) = service_with_dirs().await;
        let user_id = seed_user(&pool).await;
        let other_user = seed_user(&pool).await;
        let facility_id = seed_facility(&pool).await;
        let other_facility = seed_facility(&pool).await;

        let review_a = seed_review(&pool, user_id, facility_id).await;
        let review_b = seed_review(&pool, other_user, facility_id).await;
        let review_c = seed_review(&pool, user_id, other_facility).await;

        service.attach(review_a, &png_upload("a.png", 10)).await.unwrap();
        service.attach(review_a, &png_upload("b.png", 10)).await.unwrap();
        service.attach(review_b, &png_upload("c.png", 10)).await.unwrap();
        service.attach(review_c, &png_upload("d.png", 10)).await.unwrap();

        assert_eq!(service.list_for_review(review_a).await.unwrap().len(), 2);
        assert_eq!(service.list_for_user(user_id).await.unwrap().len(), 3);
        assert_eq!(
            service.list_for_facility(facility_id).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn test_download_returns_metadata_and_bytes() {
        let (service, _dir, pool) = service_with_dirs().await;
        let review_id = seeded_review(&pool).await;

        let upload = png_upload("photo.png", 321);
        let attachment = service.attach(review_id, &upload).await.unwrap();

        let (meta, bytes) = service
            .download(&attachment.stored_filename)
            .await
            .unwrap();
        assert_eq!(meta.id, attachment.id);
        assert_eq!(bytes, upload.data);

        let err = service
            .download("20240101_000000_deadbeef.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_storage_totals_sum_sizes() {
        let (service, _dir, pool) = service_with_dirs().await;
        let review_id = seeded_review(&pool).await;

        let (count, bytes) = service.storage_totals().await.unwrap();
        assert_eq!((count, bytes), (0, 0));

        service.attach(review_id, &png_upload("a.png", 100)).await.unwrap();
        service.attach(review_id, &png_upload("b.png", 250)).await.unwrap();

        let (count, bytes) = service.storage_totals().await.unwrap();
        assert_eq!((count, bytes), (2, 350));
    }
}
