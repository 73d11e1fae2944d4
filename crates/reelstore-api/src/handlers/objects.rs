//! Signed object downloads for the local storage backend (no auth).
//!
//! The query string carries the credential: an expiry timestamp and an HMAC
//! over bucket, key and expiry.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    response::{IntoResponse, Response},
};
use reelstore_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

#[derive(Debug, Deserialize)]
pub struct SignedObjectQuery {
    pub expires: u64,
    pub signature: String,
}

#[tracing::instrument(skip(state, query, request), fields(operation = "get_object"))]
pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    query: Result<Query<SignedObjectQuery>, QueryRejection>,
    request: Request,
) -> Result<Response, HttpAppError> {
    let local = state
        .local_storage
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Object not found".to_string()))?;
    let Query(query) = query.map_err(|e| {
        AppError::BadRequest(format!("Missing or invalid signature parameters: {}", e))
    })?;

    let path = local
        .open_signed(&bucket, &key, query.expires, &query.signature)
        .await?;

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}
