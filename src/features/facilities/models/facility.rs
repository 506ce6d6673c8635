use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for reviewable facilities
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
