use axum::{
    extract::{multipart::Field, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::extractor::AppJson;
use crate::features::attachments::dtos::UploadedFile;
use crate::features::reviews::dtos::{
    CreateReviewDto, CreateReviewFormDto, DeleteReviewQuery, EligibilityQuery,
    EligibilityResponseDto, ReviewResponseDto, UpdateReviewDto,
};
use crate::features::reviews::services::ReviewService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

async fn read_text_field(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read {} field: {}", name, e)))
}

async fn read_uuid_field(field: Field<'_>, name: &str) -> Result<Uuid, AppError> {
    let text = read_text_field(field, name).await?;
    Uuid::parse_str(text.trim())
        .map_err(|_| AppError::BadRequest(format!("{} must be a valid UUID", name)))
}

/// Submit a review
///
/// Accepts multipart/form-data with:
/// - `user_id`: author UUID (required)
/// - `facility_id`: facility UUID (required)
/// - `content`: review text (required)
/// - `rating`: 1-5 (required)
/// - `files`: image attachments, repeatable (optional)
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "reviews",
    request_body(
        content = CreateReviewFormDto,
        content_type = "multipart/form-data",
        description = "Review form with optional image attachments",
    ),
    responses(
        (status = 201, description = "Review submitted for moderation", body = ApiResponse<ReviewResponseDto>),
        (status = 400, description = "Malformed form data or invalid file"),
        (status = 404, description = "Unknown user or facility"),
        (status = 409, description = "User has already reviewed this facility"),
        (status = 413, description = "Request body too large")
    )
)]
pub async fn create_review(
    State(service): State<Arc<ReviewService>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponseDto>>), AppError> {
    let mut user_id: Option<Uuid> = None;
    let mut facility_id: Option<Uuid> = None;
    let mut content: Option<String> = None;
    let mut rating: Option<i32> = None;
    let mut files: Vec<UploadedFile> = Vec::new();

    // Process multipart fields
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "user_id" => user_id = Some(read_uuid_field(field, "user_id").await?),
            "facility_id" => facility_id = Some(read_uuid_field(field, "facility_id").await?),
            "content" => content = Some(read_text_field(field, "content").await?),
            "rating" => {
                let text = read_text_field(field, "rating").await?;
                let value = text.trim().parse::<i32>().map_err(|_| {
                    AppError::BadRequest("rating must be an integer".to_string())
                })?;
                rating = Some(value);
            }
            "files" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                files.push(UploadedFile {
                    data: data.to_vec(),
                    content_type,
                    file_name,
                });
            }
            _ => {
                // Ignore unknown fields
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    // Validate required fields
    let dto = CreateReviewDto {
        user_id: user_id.ok_or_else(|| AppError::BadRequest("user_id is required".to_string()))?,
        facility_id: facility_id
            .ok_or_else(|| AppError::BadRequest("facility_id is required".to_string()))?,
        content: content.ok_or_else(|| AppError::BadRequest("content is required".to_string()))?,
        rating: rating.ok_or_else(|| AppError::BadRequest("rating is required".to_string()))?,
    };

    let review = service.create(dto, files).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(review),
            Some("Review submitted for moderation".to_string()),
            None,
        )),
    ))
}

/// Fetch a single review with its attachments
#[utoipa::path(
    get,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Review found", body = ApiResponse<ReviewResponseDto>),
        (status = 404, description = "Review not found")
    )
)]
pub async fn get_review(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponseDto>>), AppError> {
    let review = service.get(id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(Some(review), None, None)),
    ))
}

/// List a facility's approved reviews, newest first
#[utoipa::path(
    get,
    path = "/api/reviews/facility/{facility_id}",
    tag = "reviews",
    params(
        ("facility_id" = Uuid, Path, description = "Facility ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Approved reviews for the facility", body = ApiResponse<Vec<ReviewResponseDto>>)
    )
)]
pub async fn list_facility_reviews(
    State(service): State<Arc<ReviewService>>,
    Path(facility_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<ReviewResponseDto>>>), AppError> {
    let (reviews, total) = service.list_for_facility(facility_id, &pagination).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            Some(reviews),
            None,
            Some(Meta { total }),
        )),
    ))
}

/// List every review a user has written, any status
#[utoipa::path(
    get,
    path = "/api/reviews/user/{user_id}",
    tag = "reviews",
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Reviews written by the user", body = ApiResponse<Vec<ReviewResponseDto>>)
    )
)]
pub async fn list_user_reviews(
    State(service): State<Arc<ReviewService>>,
    Path(user_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<ReviewResponseDto>>>), AppError> {
    let (reviews, total) = service.list_for_user(user_id, &pagination).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            Some(reviews),
            None,
            Some(Meta { total }),
        )),
    ))
}

/// Check whether a user may still review a facility
#[utoipa::path(
    get,
    path = "/api/reviews/eligibility",
    tag = "reviews",
    params(EligibilityQuery),
    responses(
        (status = 200, description = "Eligibility verdict", body = ApiResponse<EligibilityResponseDto>)
    )
)]
pub async fn check_eligibility(
    State(service): State<Arc<ReviewService>>,
    Query(query): Query<EligibilityQuery>,
) -> Result<(StatusCode, Json<ApiResponse<EligibilityResponseDto>>), AppError> {
    let can_review = service.can_review(query.user_id, query.facility_id).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            Some(EligibilityResponseDto {
                user_id: query.user_id,
                facility_id: query.facility_id,
                can_review,
            }),
            None,
            None,
        )),
    ))
}

/// Edit a pending review (owner only)
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(
        ("id" = Uuid, Path, description = "Review ID")
    ),
    request_body = UpdateReviewDto,
    responses(
        (status = 200, description = "Review updated", body = ApiResponse<ReviewResponseDto>),
        (status = 403, description = "Caller does not own the review"),
        (status = 404, description = "Review not found"),
        (status = 409, description = "Review already moderated")
    )
)]
pub async fn update_review(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateReviewDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewResponseDto>>), AppError> {
    let review = service.update(id, dto).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(
            Some(review),
            Some("Review updated".to_string()),
            None,
        )),
    ))
}

/// Delete a review and its attachments (owner or admin)
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(
        ("id" = Uuid, Path, description = "Review ID"),
        DeleteReviewQuery
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 403, description = "Caller may not delete this review"),
        (status = 404, description = "Review not found")
    )
)]
pub async fn delete_review(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteReviewQuery>,
) -> Result<StatusCode, AppError> {
    service.delete(id, query.requester_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reviews::models::ReviewStatus;
    use crate::shared::test_helpers::test_context;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::json;

    fn review_form(user_id: Uuid, facility_id: Uuid) -> MultipartForm {
        MultipartForm::new()
            .add_text("user_id", user_id.to_string())
            .add_text("facility_id", facility_id.to_string())
            .add_text("content", "Spacious courts and friendly staff.")
            .add_text("rating", "5")
    }

    #[tokio::test]
    async fn test_create_review_over_http_returns_created() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let user_id = ctx.seed_user().await;
        let facility_id = ctx.seed_facility().await;

        let form = review_form(user_id, facility_id).add_part(
            "files",
            Part::bytes(vec![7u8; 64])
                .file_name("court.png")
                .mime_type("image/png"),
        );

        let response = server.post("/api/reviews").multipart(form).await;
        response.assert_status(StatusCode::CREATED);

        let body: ApiResponse<ReviewResponseDto> = response.json();
        assert!(body.success);
        let review = body.data.unwrap();
        assert_eq!(review.status, ReviewStatus::Pending);
        assert_eq!(review.attachments.len(), 1);

        // The stored file is immediately downloadable under its public name
        let stored_name = &review.attachments[0].stored_filename;
        let download = server.get(&format!("/api/files/{}", stored_name)).await;
        download.assert_status_ok();
        assert_eq!(
            download.header("content-type").to_str().unwrap(),
            "image/png"
        );
        assert_eq!(download.as_bytes().as_ref(), vec![7u8; 64].as_slice());
    }

    #[tokio::test]
    async fn test_create_review_with_short_content_maps_to_validation_error() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let user_id = ctx.seed_user().await;
        let facility_id = ctx.seed_facility().await;

        let form = MultipartForm::new()
            .add_text("user_id", user_id.to_string())
            .add_text("facility_id", facility_id.to_string())
            .add_text("content", "meh")
            .add_text("rating", "3");

        let response = server.post("/api/reviews").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: ApiResponse<ReviewResponseDto> = response.json();
        assert!(!body.success);
        let error = body.error.unwrap();
        assert_eq!(error.kind, "validation");
        assert!(error.fields.unwrap().contains_key("content"));
    }

    #[tokio::test]
    async fn test_create_review_rejects_bad_file_with_position() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let user_id = ctx.seed_user().await;
        let facility_id = ctx.seed_facility().await;

        let form = review_form(user_id, facility_id).add_part(
            "files",
            Part::bytes(vec![1u8; 32])
                .file_name("notes.pdf")
                .mime_type("application/pdf"),
        );

        let response = server.post("/api/reviews").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: ApiResponse<ReviewResponseDto> = response.json();
        let error = body.error.unwrap();
        assert_eq!(error.kind, "invalid_file");
        assert!(body.message.unwrap().starts_with("file 1:"));
    }

    #[tokio::test]
    async fn test_duplicate_review_over_http_conflicts() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let user_id = ctx.seed_user().await;
        let facility_id = ctx.seed_facility().await;

        let first = server
            .post("/api/reviews")
            .multipart(review_form(user_id, facility_id))
            .await;
        first.assert_status(StatusCode::CREATED);

        let second = server
            .post("/api/reviews")
            .multipart(review_form(user_id, facility_id))
            .await;
        second.assert_status(StatusCode::CONFLICT);

        let eligibility = server
            .get("/api/reviews/eligibility")
            .add_query_param("user_id", user_id.to_string())
            .add_query_param("facility_id", facility_id.to_string())
            .await;
        eligibility.assert_status_ok();
        let body: ApiResponse<EligibilityResponseDto> = eligibility.json();
        assert!(!body.data.unwrap().can_review);
    }

    #[tokio::test]
    async fn test_update_and_delete_over_http() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let user_id = ctx.seed_user().await;
        let facility_id = ctx.seed_facility().await;

        let created = server
            .post("/api/reviews")
            .multipart(review_form(user_id, facility_id))
            .await;
        let review_id = created
            .json::<ApiResponse<ReviewResponseDto>>()
            .data
            .unwrap()
            .id;

        let updated = server
            .put(&format!("/api/reviews/{}", review_id))
            .json(&json!({
                "user_id": user_id,
                "content": "Edited before any moderator looked at it.",
                "rating": 4
            }))
            .await;
        updated.assert_status_ok();

        let deleted = server
            .delete(&format!("/api/reviews/{}", review_id))
            .add_query_param("requester_id", user_id.to_string())
            .await;
        deleted.assert_status(StatusCode::NO_CONTENT);

        let missing = server.get(&format!("/api/reviews/{}", review_id)).await;
        missing.assert_status(StatusCode::NOT_FOUND);
        let body: ApiResponse<ReviewResponseDto> = missing.json();
        assert_eq!(body.error.unwrap().kind, "not_found");
    }
}
