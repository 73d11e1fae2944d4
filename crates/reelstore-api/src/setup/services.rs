//! Service initialization and application state setup

use crate::auth::JwtService;
use crate::services::upload::{PipelineConfig, UploadPipeline};
use crate::state::AppState;
use anyhow::{Context, Result};
use reelstore_core::Config;
use reelstore_db::AssetRepository;
use reelstore_processing::{FfmpegFastStart, FfprobeProber, StagingArea};
use reelstore_storage::{create_storage, LocalAssetStore};
use std::sync::Arc;
use std::time::Duration;

/// Wire storage, processing tools and the upload pipeline into the application state
pub async fn initialize_services(
    config: &Config,
    assets: Arc<dyn AssetRepository>,
) -> Result<Arc<AppState>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize object storage")?;
    let object_store = storage.as_storage();
    tracing::info!(
        backend = %object_store.backend_type(),
        bucket = %config.upload_bucket(),
        "Object storage initialized"
    );

    let asset_store = LocalAssetStore::new(
        config.assets_root().clone(),
        config.public_host().to_string(),
        config.server_port(),
    )
    .await
    .context("Failed to initialize asset directory")?;

    let staging = StagingArea::new(config.staging_dir().clone())
        .await
        .context("Failed to initialize staging directory")?;

    let timeout = Duration::from_secs(config.process_timeout_secs());
    let prober = FfprobeProber::new(config.ffprobe_path().to_string(), timeout)
        .context("Invalid FFPROBE_PATH")?;
    let optimizer = FfmpegFastStart::new(config.ffmpeg_path().to_string(), timeout)
        .context("Invalid FFMPEG_PATH")?;

    tracing::info!(
        assets_root = %config.assets_root().display(),
        staging_dir = %config.staging_dir().display(),
        process_timeout_secs = config.process_timeout_secs(),
        "Upload pipeline initialized"
    );

    let pipeline = UploadPipeline::new(
        assets.clone(),
        object_store,
        asset_store,
        staging,
        Arc::new(prober),
        Arc::new(optimizer),
        PipelineConfig::from_config(config),
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        assets,
        pipeline: Arc::new(pipeline),
        jwt: Arc::new(JwtService::new(config.jwt_secret(), config.jwt_issuer())),
        local_storage: storage.local(),
    }))
}
