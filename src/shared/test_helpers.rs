#[cfg(test)]
use std::path::Path;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use axum::Router;
#[cfg(test)]
use chrono::Utc;
#[cfg(test)]
use fake::faker::company::en::CompanyName;
#[cfg(test)]
use fake::faker::internet::en::{SafeEmail, Username};
#[cfg(test)]
use fake::Fake;
#[cfg(test)]
use sqlx::sqlite::SqlitePoolOptions;
#[cfg(test)]
use sqlx::SqlitePool;
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
use crate::core::config::StorageConfig;
#[cfg(test)]
use crate::features::attachments::dtos::UploadedFile;
#[cfg(test)]
use crate::features::attachments::services::AttachmentService;
#[cfg(test)]
use crate::features::facilities::services::FacilityService;
#[cfg(test)]
use crate::features::reviews::models::ReviewStatus;
#[cfg(test)]
use crate::features::reviews::services::ReviewService;
#[cfg(test)]
use crate::features::stats::services::StatsService;
#[cfg(test)]
use crate::features::users::models::UserRole;
#[cfg(test)]
use crate::features::users::services::UserService;
#[cfg(test)]
use crate::modules::storage::DiskStorage;

/// In-memory database with all migrations applied
#[cfg(test)]
#[allow(dead_code)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

/// Storage engine rooted in a throwaway directory; keep the TempDir
/// alive for the duration of the test
#[cfg(test)]
#[allow(dead_code)]
pub async fn temp_storage() -> (DiskStorage, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let storage = DiskStorage::new(&StorageConfig {
        root_dir: dir.path().to_string_lossy().into_owned(),
    });
    storage.init().await.expect("failed to init storage");
    (storage, dir)
}

#[cfg(test)]
#[allow(dead_code)]
async fn insert_user(pool: &SqlitePool, role: UserRole) -> Uuid {
    let id = Uuid::new_v4();
    // Fake identities plus a uuid suffix so unique columns never collide
    let suffix = &id.simple().to_string()[..6];
    let username = format!("{}_{}", Username().fake::<String>(), suffix);
    let email = format!("{}.{}", suffix, SafeEmail().fake::<String>());

    sqlx::query("INSERT INTO users (id, username, email, role, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(role)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("failed to seed user");
    id
}

#[cfg(test)]
#[allow(dead_code)]
pub async fn seed_user(pool: &SqlitePool) -> Uuid {
    insert_user(pool, UserRole::User).await
}

#[cfg(test)]
#[allow(dead_code)]
pub async fn seed_admin(pool: &SqlitePool) -> Uuid {
    insert_user(pool, UserRole::Admin).await
}

#[cfg(test)]
#[allow(dead_code)]
pub async fn seed_facility(pool: &SqlitePool) -> Uuid {
    let id = Uuid::new_v4();
    let name: String = CompanyName().fake();

    sqlx::query("INSERT INTO facilities (id, name, created_at) VALUES (?, ?, ?)")
        .bind(id)
        .bind(name)
        .bind(Utc::now())
        .execute(pool)
        .await
        .expect("failed to seed facility");
    id
}

/// Insert a pending review directly, bypassing the service layer
#[cfg(test)]
#[allow(dead_code)]
pub async fn seed_review(pool: &SqlitePool, user_id: Uuid, facility_id: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO reviews \
         (id, user_id, facility_id, content, rating, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(facility_id)
    .bind("Seeded review content, long enough to validate.")
    .bind(4)
    .bind(ReviewStatus::Pending)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("failed to seed review");
    id
}

/// A syntactically acceptable PNG upload of the requested size
#[cfg(test)]
#[allow(dead_code)]
pub fn png_upload(file_name: &str, size: usize) -> UploadedFile {
    UploadedFile {
        data: vec![0x89u8; size],
        content_type: "image/png".to_string(),
        file_name: file_name.to_string(),
    }
}

/// Fully wired service stack over an in-memory database and a
/// throwaway storage directory
#[cfg(test)]
#[allow(dead_code)]
pub struct TestContext {
    pub pool: SqlitePool,
    pub users: Arc<UserService>,
    pub facilities: Arc<FacilityService>,
    pub attachments: Arc<AttachmentService>,
    pub reviews: Arc<ReviewService>,
    pub stats: Arc<StatsService>,
    storage_dir: tempfile::TempDir,
}

#[cfg(test)]
#[allow(dead_code)]
impl TestContext {
    pub async fn seed_user(&self) -> Uuid {
        seed_user(&self.pool).await
    }

    pub async fn seed_admin(&self) -> Uuid {
        seed_admin(&self.pool).await
    }

    pub async fn seed_facility(&self) -> Uuid {
        seed_facility(&self.pool).await
    }

    pub fn storage_dir(&self) -> &Path {
        self.storage_dir.path()
    }

    /// The application router as main wires it, minus the outer layers
    pub fn router(&self) -> Router {
        Router::new()
            .merge(crate::features::reviews::routes(self.reviews.clone()))
            .merge(crate::features::attachments::routes(
                self.attachments.clone(),
            ))
            .merge(crate::features::stats::routes(self.stats.clone()))
            .nest(
                "/api/admin",
                crate::features::admin::routes(self.reviews.clone(), self.attachments.clone()),
            )
    }
}

#[cfg(test)]
#[allow(dead_code)]
pub async fn test_context() -> TestContext {
    let pool = memory_pool().await;
    let (storage, storage_dir) = temp_storage().await;

    let users = Arc::new(UserService::new(pool.clone()));
    let facilities = Arc::new(FacilityService::new(pool.clone()));
    let attachments = Arc::new(AttachmentService::new(pool.clone(), Arc::new(storage)));
    let reviews = Arc::new(ReviewService::new(
        pool.clone(),
        attachments.clone(),
        users.clone(),
        facilities.clone(),
    ));
    let stats = Arc::new(StatsService::new(pool.clone()));

    TestContext {
        pool,
        users,
        facilities,
        attachments,
        reviews,
        stats,
        storage_dir,
    }
}
