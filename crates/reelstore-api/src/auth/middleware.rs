use crate::auth::jwt::JwtService;
use crate::auth::models::OwnerContext;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use reelstore_core::AppError;
use std::sync::Arc;

const BEARER_PREFIX: &str = "Bearer ";

/// Resolve `Authorization: Bearer <jwt>` into an `OwnerContext`.
///
/// Runs before any handler, so an unauthenticated request never reaches the
/// upload pipeline.
pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthenticated(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix(BEARER_PREFIX) else {
        return HttpAppError(AppError::Unauthenticated(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    match jwt.validate(token.trim()) {
        Ok(user_id) => {
            request.extensions_mut().insert(OwnerContext { user_id });
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
