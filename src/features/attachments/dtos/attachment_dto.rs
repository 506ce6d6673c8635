use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::attachments::models::Attachment;

/// A file received from the transport layer, not yet validated or stored
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl UploadedFile {
    /// Empty uploads are skipped rather than rejected
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Response DTO for attachment metadata
///
/// Deliberately omits `file_path`; clients address files through
/// `stored_filename` only.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachmentResponseDto {
    pub id: Uuid,
    pub review_id: Uuid,
    pub original_filename: String,
    pub stored_filename: String,
    pub content_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponseDto {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id,
            review_id: attachment.review_id,
            original_filename: attachment.original_filename,
            stored_filename: attachment.stored_filename,
            content_type: attachment.content_type,
            file_size: attachment.file_size,
            created_at: attachment.created_at,
        }
    }
}

/// Response DTO for the orphaned-metadata sweep
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconcileResponseDto {
    pub removed: u64,
}

/// Response DTO for a single attachment integrity check
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IntegrityResponseDto {
    pub attachment_id: Uuid,
    pub valid: bool,
}
