pub mod health;
pub mod objects;
pub mod thumbnail_upload;
pub mod video_upload;
pub mod videos;

use axum::extract::{rejection::PathRejection, Path};
use reelstore_core::AppError;
use uuid::Uuid;

/// Video id from the request path; malformed ids are a 400 in our error shape.
pub(crate) fn video_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::BadRequest(format!("Invalid video id: {}", e.body_text())))
}
