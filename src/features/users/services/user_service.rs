use sqlx::SqlitePool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{User, UserRole};

/// Read-only directory of review authors and moderators
///
/// User accounts are provisioned elsewhere; the review lifecycle only
/// needs lookups and role checks.
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch user {}: {:?}", user_id, e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {}", user_id)))
    }

    /// Unknown principals are simply not admins
    pub async fn is_admin(&self, user_id: Uuid) -> Result<bool> {
        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch role for user {}: {:?}", user_id, e);
                AppError::Database(e)
            })?;

        Ok(matches!(role, Some(UserRole::Admin)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{memory_pool, seed_admin, seed_user};

    #[tokio::test]
    async fn test_get_returns_seeded_user() {
        let pool = memory_pool().await;
        let user_id = seed_user(&pool).await;

        let service = UserService::new(pool);
        let user = service.get(user_id).await.unwrap();

        assert_eq!(user.id, user_id);
        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_not_found() {
        let pool = memory_pool().await;
        let service = UserService::new(pool);

        let err = service.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_is_admin_distinguishes_roles() {
        let pool = memory_pool().await;
        let user_id = seed_user(&pool).await;
        let admin_id = seed_admin(&pool).await;

        let service = UserService::new(pool);
        assert!(!service.is_admin(user_id).await.unwrap());
        assert!(service.is_admin(admin_id).await.unwrap());
        assert!(!service.is_admin(Uuid::new_v4()).await.unwrap());
    }
}
