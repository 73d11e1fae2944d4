use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::storage::ObjectReference;

/// A user-owned video record. Registered by the owner, then filled in by uploads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Relative key under the local assets root.
    pub thumbnail_path: Option<String>,
    /// Unsigned object store location; signed per response.
    pub video_reference: Option<ObjectReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaAsset {
    pub fn new(user_id: Uuid, title: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description,
            thumbnail_path: None,
            video_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Client view of a `MediaAsset`. `video_url` is always a signed URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn from_asset(
        asset: MediaAsset,
        thumbnail_url: Option<String>,
        video_url: Option<String>,
    ) -> Self {
        VideoResponse {
            id: asset.id,
            user_id: asset.user_id,
            title: asset.title,
            description: asset.description,
            thumbnail_url,
            video_url,
            created_at: asset.created_at,
            updated_at: asset.updated_at,
        }
    }
}
