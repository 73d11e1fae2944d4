//! Common utilities for file upload handlers

use axum::extract::multipart::{Multipart, MultipartRejection};
use reelstore_core::AppError;
use reelstore_processing::{StagedFile, StagingArea};
use reelstore_storage::extension_for;

use crate::error::app_error_from_staging;

/// Media type of a multipart part: parameters stripped, lower-cased.
pub fn normalize_content_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Reject media types outside `allowed`.
pub fn validate_content_type(media_type: &str, allowed: &[String]) -> Result<(), AppError> {
    if allowed.iter().any(|a| a == media_type) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid content type '{}', allowed: {}",
            media_type,
            allowed.join(", ")
        )))
    }
}

/// A multipart part written to staging, with its declared media type.
#[derive(Debug)]
pub struct StagedPart {
    pub file: StagedFile,
    pub media_type: String,
}

/// Stage the first part named `field_name`.
///
/// The part's media type is checked against `allowed` before any byte is
/// written, and at most `max_bytes` are accepted.
pub async fn stage_multipart_field(
    multipart: Result<Multipart, MultipartRejection>,
    field_name: &str,
    allowed: &[String],
    staging: &StagingArea,
    max_bytes: u64,
) -> Result<StagedPart, AppError> {
    let mut multipart = multipart
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let media_type = field
            .content_type()
            .map(normalize_content_type)
            .ok_or_else(|| {
                AppError::BadRequest(format!("Field '{}' has no content type", field_name))
            })?;
        validate_content_type(&media_type, allowed)?;

        let extension = extension_for(&media_type).ok_or_else(|| {
            AppError::UnsupportedMediaType(format!("Unsupported media type: {}", media_type))
        })?;

        let file = staging
            .stage_stream(field, &format!(".{}", extension), max_bytes)
            .await
            .map_err(app_error_from_staging)?;

        if file.size() == 0 {
            return Err(AppError::BadRequest("File is empty".to_string()));
        }

        return Ok(StagedPart { file, media_type });
    }

    Err(AppError::BadRequest(format!(
        "No file provided; expected a multipart field named '{}'",
        field_name
    )))
}
