use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::attachments::dtos::AttachmentResponseDto;
use crate::features::attachments::services::AttachmentService;
use crate::shared::types::ApiResponse;
use crate::shared::validation::STORED_FILENAME_REGEX;

/// Strip characters that cannot travel in a Content-Disposition header
fn disposition_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' '))
        .collect()
}

/// Serve an attachment inline
///
/// The stored name is the public handle; anything not matching the
/// generated-name shape is rejected before touching the database.
#[utoipa::path(
    get,
    path = "/api/files/{stored_name}",
    tag = "files",
    params(
        ("stored_name" = String, Path, description = "Generated stored file name")
    ),
    responses(
        (status = 200, description = "File content with its original content type"),
        (status = 400, description = "Malformed stored file name"),
        (status = 404, description = "No attachment with this stored name")
    )
)]
pub async fn serve_attachment(
    State(service): State<Arc<AttachmentService>>,
    Path(stored_name): Path<String>,
) -> Result<Response, AppError> {
    let (attachment, bytes) = fetch_file(&service, &stored_name).await?;

    let headers = [
        (header::CONTENT_TYPE, attachment.content_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "inline; filename=\"{}\"",
                disposition_filename(&attachment.original_filename)
            ),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// Serve an attachment as a forced download
#[utoipa::path(
    get,
    path = "/api/files/{stored_name}/download",
    tag = "files",
    params(
        ("stored_name" = String, Path, description = "Generated stored file name")
    ),
    responses(
        (status = 200, description = "File content as an octet-stream download"),
        (status = 400, description = "Malformed stored file name"),
        (status = 404, description = "No attachment with this stored name")
    )
)]
pub async fn download_attachment(
    State(service): State<Arc<AttachmentService>>,
    Path(stored_name): Path<String>,
) -> Result<Response, AppError> {
    let (attachment, bytes) = fetch_file(&service, &stored_name).await?;

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/octet-stream".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                disposition_filename(&attachment.original_filename)
            ),
        ),
    ];
    Ok((headers, bytes).into_response())
}

async fn fetch_file(
    service: &AttachmentService,
    stored_name: &str,
) -> Result<(crate::features::attachments::models::Attachment, Vec<u8>), AppError> {
    if !STORED_FILENAME_REGEX.is_match(stored_name) {
        return Err(AppError::BadRequest(
            "Invalid stored file name".to_string(),
        ));
    }
    service.download(stored_name).await
}

/// List attachments of one review
#[utoipa::path(
    get,
    path = "/api/files/review/{review_id}",
    tag = "files",
    params(
        ("review_id" = Uuid, Path, description = "Review ID")
    ),
    responses(
        (status = 200, description = "Attachments of the review", body = ApiResponse<Vec<AttachmentResponseDto>>)
    )
)]
pub async fn list_review_attachments(
    State(service): State<Arc<AttachmentService>>,
    Path(review_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AttachmentResponseDto>>>), AppError> {
    let attachments = service.list_for_review(review_id).await?;
    let dtos: Vec<AttachmentResponseDto> = attachments
        .into_iter()
        .map(AttachmentResponseDto::from)
        .collect();

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(Some(dtos), None, None)),
    ))
}

/// List attachments across every review written by a user
#[utoipa::path(
    get,
    path = "/api/files/user/{user_id}",
    tag = "files",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Attachments uploaded by the user", body = ApiResponse<Vec<AttachmentResponseDto>>)
    )
)]
pub async fn list_user_attachments(
    State(service): State<Arc<AttachmentService>>,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AttachmentResponseDto>>>), AppError> {
    let attachments = service.list_for_user(user_id).await?;
    let dtos: Vec<AttachmentResponseDto> = attachments
        .into_iter()
        .map(AttachmentResponseDto::from)
        .collect();

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(Some(dtos), None, None)),
    ))
}

/// List attachments across every review of a facility
#[utoipa::path(
    get,
    path = "/api/files/facility/{facility_id}",
    tag = "files",
    params(
        ("facility_id" = Uuid, Path, description = "Facility ID")
    ),
    responses(
        (status = 200, description = "Attachments for the facility", body = ApiResponse<Vec<AttachmentResponseDto>>)
    )
)]
pub async fn list_facility_attachments(
    State(service): State<Arc<AttachmentService>>,
    Path(facility_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<AttachmentResponseDto>>>), AppError> {
    let attachments = service.list_for_facility(facility_id).await?;
    let dtos: Vec<AttachmentResponseDto> = attachments
        .into_iter()
        .map(AttachmentResponseDto::from)
        .collect();

    Ok((
        StatusCode::OK,
        Json(ApiResponse::success(Some(dtos), None, None)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{png_upload, seed_review, test_context};
    use axum_test::TestServer;

    #[test]
    fn test_disposition_filename_drops_header_breaking_chars() {
        assert_eq!(disposition_filename("photo.png"), "photo.png");
        assert_eq!(
            disposition_filename("we\"ird\r\nname.jpg"),
            "weirdname.jpg"
        );
        assert_eq!(disposition_filename("a b-c_d.jpeg"), "a b-c_d.jpeg");
    }

    #[tokio::test]
    async fn test_inline_and_download_headers_over_http() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();
        let user_id = ctx.seed_user().await;
        let facility_id = ctx.seed_facility().await;
        let review_id = seed_review(&ctx.pool, user_id, facility_id).await;

        let upload = png_upload("holiday photo.png", 64);
        let attachment = ctx.attachments.attach(review_id, &upload).await.unwrap();

        let inline = server
            .get(&format!("/api/files/{}", attachment.stored_filename))
            .await;
        inline.assert_status_ok();
        assert_eq!(inline.header("content-type").to_str().unwrap(), "image/png");
        assert_eq!(
            inline.header("content-disposition").to_str().unwrap(),
            "inline; filename=\"holiday photo.png\""
        );

        let download = server
            .get(&format!("/api/files/{}/download", attachment.stored_filename))
            .await;
        download.assert_status_ok();
        assert_eq!(
            download.header("content-type").to_str().unwrap(),
            "application/octet-stream"
        );
        assert_eq!(
            download.header("content-disposition").to_str().unwrap(),
            "attachment; filename=\"holiday photo.png\""
        );
        assert_eq!(download.as_bytes().as_ref(), vec![0x89u8; 64].as_slice());
    }

    #[tokio::test]
    async fn test_file_routes_gate_on_stored_name_shape() {
        let ctx = test_context().await;
        let server = TestServer::new(ctx.router()).unwrap();

        // Original filenames are not public handles, only generated names are
        let malformed = server.get("/api/files/photo.png").await;
        malformed.assert_status(StatusCode::BAD_REQUEST);

        // Well-formed but unknown names fall through to the metadata lookup
        let unknown = server.get("/api/files/20240101_120000_deadbeef.png").await;
        unknown.assert_status(StatusCode::NOT_FOUND);
    }
}
