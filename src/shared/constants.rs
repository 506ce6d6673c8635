/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// UPLOAD CONSTANTS
// =============================================================================

/// Maximum accepted size per uploaded file in bytes (10 MiB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Content types accepted for review attachments
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// File extensions accepted for review attachments (lowercase, without dot)
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Request body ceiling for the multipart create-review route: a handful of
/// full-size images plus multipart framing
pub const UPLOAD_BODY_LIMIT: usize = 5 * MAX_UPLOAD_SIZE + 1024 * 1024;
