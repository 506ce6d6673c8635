use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::reviews::handlers::{
    check_eligibility, create_review, delete_review, get_review, list_facility_reviews,
    list_user_reviews, update_review,
};
use crate::features::reviews::services::ReviewService;
use crate::shared::constants::UPLOAD_BODY_LIMIT;

/// Create routes for the reviews feature
pub fn routes(review_service: Arc<ReviewService>) -> Router {
    Router::new()
        .route(
            "/api/reviews",
            // Body limit covers several full-size images plus multipart overhead
            post(create_review).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/reviews/eligibility", get(check_eligibility))
        .route(
            "/api/reviews/{id}",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route(
            "/api/reviews/facility/{facility_id}",
            get(list_facility_reviews),
        )
        .route("/api/reviews/user/{user_id}", get(list_user_reviews))
        .with_state(review_service)
}
