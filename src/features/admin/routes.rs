use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::admin::handlers::{self, AdminState};
use crate::features::attachments::services::AttachmentService;
use crate::features::reviews::services::ReviewService;

/// Create admin routes; the caller nests these under `/api/admin`
pub fn routes(
    review_service: Arc<ReviewService>,
    attachment_service: Arc<AttachmentService>,
) -> Router {
    let state = AdminState {
        review_service,
        attachment_service,
    };

    Router::new()
        .route("/reviews/pending", get(handlers::list_pending_reviews))
        .route("/reviews/{id}/approve", post(handlers::approve_review))
        .route("/reviews/{id}/reject", post(handlers::reject_review))
        .route(
            "/attachments/reconcile",
            post(handlers::reconcile_attachments),
        )
        .route("/attachments/{id}/verify", get(handlers::verify_attachment))
        .route("/dashboard", get(handlers::dashboard))
        .with_state(state)
}
