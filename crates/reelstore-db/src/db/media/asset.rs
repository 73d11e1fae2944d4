//! Media asset repository: CRUD for the videos table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reelstore_core::{AppError, MediaAsset, ObjectReference};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Record store for media assets.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn create_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError>;

    async fn get_asset(&self, id: Uuid) -> Result<Option<MediaAsset>, AppError>;

    /// Newest first.
    async fn list_assets_for_user(&self, user_id: Uuid) -> Result<Vec<MediaAsset>, AppError>;

    /// Replace the mutable fields of an existing asset. `updated_at` is set by the store.
    async fn update_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError>;
}

/// Row type for the videos table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct VideoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRow {
    pub fn to_media_asset(self) -> Result<MediaAsset, AppError> {
        let video_reference = self
            .video_url
            .as_deref()
            .map(|raw| {
                raw.parse::<ObjectReference>().map_err(|e| {
                    AppError::Internal(format!(
                        "Stored video reference for {} is malformed: {}",
                        self.id, e
                    ))
                })
            })
            .transpose()?;

        Ok(MediaAsset {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            thumbnail_path: self.thumbnail_url,
            video_reference,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at";

/// Postgres-backed repository.
#[derive(Clone)]
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    #[tracing::instrument(skip(self, asset), fields(db.table = "videos", asset_id = %asset.id))]
    async fn create_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError> {
        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            INSERT INTO videos (id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(asset.id)
        .bind(asset.user_id)
        .bind(&asset.title)
        .bind(&asset.description)
        .bind(&asset.thumbnail_path)
        .bind(asset.video_reference.as_ref().map(|r| r.encode()))
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.to_media_asset()
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn get_asset(&self, id: Uuid) -> Result<Option<MediaAsset>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(VideoRow::to_media_asset).transpose()
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn list_assets_for_user(&self, user_id: Uuid) -> Result<Vec<MediaAsset>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(VideoRow::to_media_asset).collect()
    }

    #[tracing::instrument(skip(self, asset), fields(db.table = "videos", asset_id = %asset.id))]
    async fn update_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            UPDATE videos
            SET title = $2, description = $3, thumbnail_url = $4, video_url = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(asset.id)
        .bind(&asset.title)
        .bind(&asset.description)
        .bind(&asset.thumbnail_path)
        .bind(asset.video_reference.as_ref().map(|r| r.encode()))
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| {
            AppError::PersistenceFailed(format!("Video {} no longer exists", asset.id))
        })?
        .to_media_asset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(video_url: Option<&str>) -> VideoRow {
        let now = Utc::now();
        VideoRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Trip".to_string(),
            description: None,
            thumbnail_url: Some("abc.png".to_string()),
            video_url: video_url.map(String::from),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_parses_stored_reference() {
        let asset = row(Some("reels,landscape/k.mp4")).to_media_asset().unwrap();
        assert_eq!(
            asset.video_reference,
            Some(ObjectReference::new("reels", "landscape/k.mp4"))
        );
        assert_eq!(asset.thumbnail_path.as_deref(), Some("abc.png"));
    }

    #[test]
    fn row_without_video_has_no_reference() {
        let asset = row(None).to_media_asset().unwrap();
        assert!(asset.video_reference.is_none());
    }

    #[test]
    fn malformed_reference_is_internal_error() {
        let result = row(Some("https://legacy.example/video.mp4")).to_media_asset();
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
