use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::facilities::models::Facility;

/// Read-only lookup for the facilities reviews are written against
pub struct FacilityService {
    pool: SqlitePool,
}

impl FacilityService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, facility_id: Uuid) -> Result<Facility> {
        sqlx::query_as::<_, Facility>("SELECT * FROM facilities WHERE id = ?")
            .bind(facility_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch facility {}: {:?}", facility_id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| {
                AppError::NotFound(format!("Facility not found with id: {}", facility_id))
            })
    }
}
