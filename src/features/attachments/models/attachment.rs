use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for attachment metadata
///
/// `stored_filename` is the generated on-disk name and the public handle
/// for downloads; `file_path` stays internal and never leaves the server.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct Attachment {
    pub id: Uuid,
    pub review_id: Uuid,
    pub original_filename: String,
    pub stored_filename: String,
    pub file_path: String,
    pub content_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}
