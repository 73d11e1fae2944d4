use crate::auth::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::PathRejection,
        Path, State,
    },
    Json,
};
use reelstore_core::VideoResponse;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/videos/{id}/video",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video id")),
    request_body(content = inline(Object), content_type = "multipart/form-data", description = "Single part named `video`"),
    responses(
        (status = 200, description = "Video processed and stored", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    path: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let id = super::video_id(path)?;
    let response = state
        .pipeline
        .upload_video(owner.user_id, id, multipart)
        .await?;
    Ok(Json(response))
}
