//! Upload pipeline
//!
//! Each upload runs strictly in order: resolve asset → check owner → stage part
//! → (video: probe → remux) → derive key → store → persist → render.
//! Staged files are owned by the pipeline future, so every exit path,
//! cancellation included, removes them.

use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use reelstore_core::{AppError, MediaAsset, VideoResponse};
use reelstore_db::AssetRepository;
use reelstore_processing::{MediaProber, StagingArea, StreamOptimizer};
use reelstore_storage::{derive_key, LocalAssetStore, Storage};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{PipelineConfig, UploadKind};
use crate::error::app_error_from_storage;
use crate::utils::upload::{stage_multipart_field, StagedPart};

pub struct UploadPipeline {
    assets: Arc<dyn AssetRepository>,
    storage: Arc<dyn Storage>,
    asset_store: LocalAssetStore,
    staging: StagingArea,
    prober: Arc<dyn MediaProber>,
    optimizer: Arc<dyn StreamOptimizer>,
    config: PipelineConfig,
}

impl UploadPipeline {
    pub fn new(
        assets: Arc<dyn AssetRepository>,
        storage: Arc<dyn Storage>,
        asset_store: LocalAssetStore,
        staging: StagingArea,
        prober: Arc<dyn MediaProber>,
        optimizer: Arc<dyn StreamOptimizer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            assets,
            storage,
            asset_store,
            staging,
            prober,
            optimizer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load an asset and check that `owner` may modify it.
    pub async fn authorize(&self, owner: Uuid, asset_id: Uuid) -> Result<MediaAsset, AppError> {
        let asset = self
            .assets
            .get_asset(asset_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", asset_id)))?;

        if !asset.is_owned_by(owner) {
            return Err(AppError::Forbidden(format!(
                "User {} does not own video {}",
                owner, asset_id
            )));
        }

        Ok(asset)
    }

    /// Store a thumbnail image in the local asset directory.
    pub async fn upload_thumbnail(
        &self,
        owner: Uuid,
        asset_id: Uuid,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<VideoResponse, AppError> {
        let span = upload_span(UploadKind::Thumbnail, owner, asset_id);
        async move {
            let mut asset = self.authorize(owner, asset_id).await?;
            let part = self.stage(UploadKind::Thumbnail, multipart).await?;

            let key = derive_key(&part.media_type, None).map_err(app_error_from_storage)?;
            let size = self
                .asset_store
                .store_file(&key, part.file.path())
                .await
                .map_err(|e| AppError::UploadFailed(e.to_string()))?;
            tracing::info!(key = %key, size_bytes = size, "Thumbnail stored");

            asset.thumbnail_path = Some(key.clone());
            let asset = self.assets.update_asset(&asset).await.map_err(|e| {
                tracing::error!(
                    key = %key,
                    error = %e,
                    "Thumbnail written but record update failed; asset file is orphaned"
                );
                persistence_failed(e)
            })?;

            self.render(asset).await
        }
        .instrument(span)
        .await
    }

    /// Probe, remux and upload a video to the object store.
    pub async fn upload_video(
        &self,
        owner: Uuid,
        asset_id: Uuid,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<VideoResponse, AppError> {
        let span = upload_span(UploadKind::Video, owner, asset_id);
        async move {
            let mut asset = self.authorize(owner, asset_id).await?;
            let part = self.stage(UploadKind::Video, multipart).await?;

            let dimensions = self
                .prober
                .probe(part.file.path())
                .await
                .map_err(|e| AppError::ProbeFailed(e.to_string()))?;
            let aspect = dimensions.aspect_class();

            let optimized = self
                .optimizer
                .optimize(part.file.path(), &self.staging)
                .await
                .map_err(|e| AppError::OptimizeFailed(e.to_string()))?;
            // The original is no longer needed once the remux succeeded.
            drop(part.file);

            let key = derive_key(&part.media_type, Some(aspect.prefix()))
                .map_err(app_error_from_storage)?;
            let bucket = self.config.upload_bucket.as_str();

            let start = std::time::Instant::now();
            let reference = self
                .storage
                .put_file(bucket, &key, optimized.path(), &part.media_type)
                .await
                .map_err(|e| AppError::UploadFailed(e.to_string()))?;
            tracing::info!(
                bucket = %reference.bucket,
                key = %reference.key,
                aspect = %aspect,
                size_bytes = optimized.size(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Video uploaded"
            );
            drop(optimized);

            asset.video_reference = Some(reference.clone());
            let asset = self.assets.update_asset(&asset).await.map_err(|e| {
                tracing::error!(
                    bucket = %reference.bucket,
                    key = %reference.key,
                    error = %e,
                    "Video uploaded but record update failed; object is orphaned"
                );
                persistence_failed(e)
            })?;

            self.render(asset).await
        }
        .instrument(span)
        .await
    }

    /// Client view of an asset with a freshly signed video URL.
    pub async fn render(&self, asset: MediaAsset) -> Result<VideoResponse, AppError> {
        let video_url = match &asset.video_reference {
            Some(reference) => Some(
                self.storage
                    .presigned_url(reference, self.config.signed_url_ttl)
                    .await
                    .map_err(|e| AppError::SigningFailed(e.to_string()))?,
            ),
            None => None,
        };
        let thumbnail_url = asset
            .thumbnail_path
            .as_deref()
            .map(|key| self.asset_store.url_for(key));

        Ok(VideoResponse::from_asset(asset, thumbnail_url, video_url))
    }

    async fn stage(
        &self,
        kind: UploadKind,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<StagedPart, AppError> {
        let part = stage_multipart_field(
            multipart,
            kind.field_name(),
            self.config.allowed_content_types(kind),
            &self.staging,
            self.config.max_bytes(kind),
        )
        .await?;
        tracing::debug!(
            media_type = %part.media_type,
            size_bytes = part.file.size(),
            "Upload staged"
        );
        Ok(part)
    }
}

fn upload_span(kind: UploadKind, owner: Uuid, asset_id: Uuid) -> tracing::Span {
    tracing::info_span!(
        "upload",
        upload.kind = kind.as_str(),
        asset_id = %asset_id,
        user_id = %owner
    )
}

fn persistence_failed(err: AppError) -> AppError {
    match err {
        AppError::PersistenceFailed(_) => err,
        other => AppError::PersistenceFailed(other.to_string()),
    }
}
