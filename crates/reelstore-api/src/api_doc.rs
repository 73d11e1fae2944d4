//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use reelstore_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reelstore API",
        version = "0.1.0",
        description = "Video registration and upload: thumbnails are stored as static assets, videos are probed, remuxed for fast start and stored in object storage behind signed URLs. An unknown video id returns 404 Not Found; a video owned by another user returns 401 Unauthorized."
    ),
    paths(
        handlers::videos::create_video,
        handlers::videos::get_video,
        handlers::videos::list_videos,
        handlers::thumbnail_upload::upload_thumbnail,
        handlers::video_upload::upload_video,
        handlers::health::health_check,
    ),
    components(schemas(
        models::CreateVideoRequest,
        models::VideoResponse,
        error::ErrorResponse,
        handlers::health::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "videos", description = "Video records and uploads"),
        (name = "health", description = "Health checks")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
