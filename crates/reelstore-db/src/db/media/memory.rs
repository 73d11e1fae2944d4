//! In-memory asset repository for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reelstore_core::{AppError, MediaAsset};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::asset::AssetRepository;

#[derive(Default)]
pub struct InMemoryAssetRepository {
    assets: RwLock<HashMap<Uuid, MediaAsset>>,
}

impl InMemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn create_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError> {
        let mut assets = self.assets.write().await;
        if assets.contains_key(&asset.id) {
            return Err(AppError::PersistenceFailed(format!(
                "Video {} already exists",
                asset.id
            )));
        }
        assets.insert(asset.id, asset.clone());
        Ok(asset.clone())
    }

    async fn get_asset(&self, id: Uuid) -> Result<Option<MediaAsset>, AppError> {
        Ok(self.assets.read().await.get(&id).cloned())
    }

    async fn list_assets_for_user(&self, user_id: Uuid) -> Result<Vec<MediaAsset>, AppError> {
        let mut owned: Vec<MediaAsset> = self
            .assets
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update_asset(&self, asset: &MediaAsset) -> Result<MediaAsset, AppError> {
        let mut assets = self.assets.write().await;
        let stored = assets.get_mut(&asset.id).ok_or_else(|| {
            AppError::PersistenceFailed(format!("Video {} no longer exists", asset.id))
        })?;
        stored.title = asset.title.clone();
        stored.description = asset.description.clone();
        stored.thumbnail_path = asset.thumbnail_path.clone();
        stored.video_reference = asset.video_reference.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}
