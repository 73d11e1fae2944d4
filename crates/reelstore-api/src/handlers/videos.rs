//! Video record handlers: register, fetch and list.

use crate::auth::OwnerContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use reelstore_core::{AppError, CreateVideoRequest, MediaAsset, VideoResponse};
use std::sync::Arc;
use uuid::Uuid;

const MAX_TITLE_LEN: usize = 200;

#[utoipa::path(
    post,
    path = "/videos",
    tag = "videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video registered", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<(StatusCode, Json<VideoResponse>), HttpAppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title must not be empty".to_string()).into());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::BadRequest(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        ))
        .into());
    }

    let asset = MediaAsset::new(owner.user_id, title, request.description);
    let asset = state.assets.create_asset(&asset).await?;
    tracing::info!(asset_id = %asset.id, user_id = %owner.user_id, "Video registered");

    let response = state.pipeline.render(asset).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/videos/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video with a freshly signed URL", body = VideoResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let id = super::video_id(path)?;
    let asset = state.pipeline.authorize(owner.user_id, id).await?;
    Ok(Json(state.pipeline.render(asset).await?))
}

#[utoipa::path(
    get,
    path = "/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Caller's videos, newest first", body = Vec<VideoResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    owner: OwnerContext,
) -> Result<Json<Vec<VideoResponse>>, HttpAppError> {
    let assets = state.assets.list_assets_for_user(owner.user_id).await?;
    let mut videos = Vec::with_capacity(assets.len());
    for asset in assets {
        videos.push(state.pipeline.render(asset).await?);
    }
    Ok(Json(videos))
}
