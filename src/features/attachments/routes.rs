use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::attachments::handlers::{
    download_attachment, list_facility_attachments, list_review_attachments,
    list_user_attachments, serve_attachment,
};
use crate::features::attachments::services::AttachmentService;

/// Create routes for attachment downloads and listings
///
/// Uploads happen through review creation; there is no standalone upload
/// endpoint.
pub fn routes(attachment_service: Arc<AttachmentService>) -> Router {
    Router::new()
        .route("/api/files/{stored_name}", get(serve_attachment))
        .route("/api/files/{stored_name}/download", get(download_attachment))
        .route("/api/files/review/{review_id}", get(list_review_attachments))
        .route("/api/files/user/{user_id}", get(list_user_attachments))
        .route(
            "/api/files/facility/{facility_id}",
            get(list_facility_attachments),
        )
        .with_state(attachment_service)
}
