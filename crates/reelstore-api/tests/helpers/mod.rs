//! Test helpers: build AppState and router for integration tests.
//!
//! The app runs against the in-memory record store, `LocalStorage` and asset
//! directories in temp dirs, and fake media tools. Object writes and record
//! updates go through switchable wrappers so failure paths can be exercised.
//! Run from workspace root: `cargo test -p reelstore-api`.
#![allow(dead_code)]

pub mod fakes;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use reelstore_api::auth::JwtService;
use reelstore_api::setup::routes;
use reelstore_api::state::AppState;
use reelstore_api::{PipelineConfig, UploadPipeline};
use reelstore_core::{BaseConfig, Config, MediaAsset, MediaServiceConfig, StorageBackend};
use reelstore_db::{AssetRepository, InMemoryAssetRepository};
use reelstore_processing::{MediaProber, StagingArea, StreamOptimizer};
use reelstore_storage::{LocalAssetStore, LocalStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

pub use fakes::{FakeOptimizer, FakeProber, FlakyAssets, FlakyStorage};

pub const JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters";
pub const SIGNING_SECRET: &str = "test-signing-secret-at-least-32-chars";
pub const BASE_URL: &str = "http://localhost:8091";
pub const BUCKET: &str = "reels";

/// Test application: server plus the directories and stores behind it.
pub struct TestApp {
    pub server: TestServer,
    pub jwt: JwtService,
    pub assets: Arc<InMemoryAssetRepository>,
    pub prober: Arc<FakeProber>,
    pub optimizer: Arc<FakeOptimizer>,
    pub storage: Arc<FlakyStorage>,
    pub records: Arc<FlakyAssets>,
    _temp_dir: TempDir,
    root: PathBuf,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.join("staging")
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("objects")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn bearer(&self, user_id: Uuid) -> String {
        let token = self
            .jwt
            .issue(user_id, Duration::from_secs(300))
            .expect("issue token");
        format!("Bearer {}", token)
    }

    /// Register a video owned by `owner` directly in the record store.
    pub async fn register_video(&self, owner: Uuid) -> MediaAsset {
        self.assets
            .create_asset(&MediaAsset::new(owner, "Test video", None))
            .await
            .expect("create asset")
    }

    pub async fn upload(
        &self,
        owner: Uuid,
        video_id: Uuid,
        route: &str,
        field: &str,
        mime: &str,
        data: &[u8],
    ) -> TestResponse {
        let part = Part::bytes(bytes::Bytes::copy_from_slice(data))
            .file_name("upload.bin")
            .mime_type(mime);
        self.server
            .post(&format!("/videos/{}/{}", video_id, route))
            .add_header("Authorization", self.bearer(owner))
            .multipart(MultipartForm::new().add_part(field.to_string(), part))
            .await
    }

    pub async fn upload_video(&self, owner: Uuid, video_id: Uuid, data: &[u8]) -> TestResponse {
        self.upload(owner, video_id, "video", "video", "video/mp4", data)
            .await
    }

    pub async fn upload_thumbnail(
        &self,
        owner: Uuid,
        video_id: Uuid,
        mime: &str,
        data: &[u8],
    ) -> TestResponse {
        self.upload(owner, video_id, "thumbnail", "thumbnail", mime, data)
            .await
    }

    /// GET a signed object URL through the test server.
    pub async fn fetch_signed(&self, url: &str) -> TestResponse {
        let relative = url
            .strip_prefix(BASE_URL)
            .expect("signed URL points at this server");
        let (path, query) = relative.split_once('?').expect("signed URL has a query");
        self.server.get(path).add_raw_query_param(query).await
    }
}

/// Number of regular files anywhere under `dir`.
pub fn file_count(dir: &Path) -> usize {
    if !dir.exists() {
        return 0;
    }
    std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                file_count(&path)
            } else {
                1
            }
        })
        .sum()
}

pub fn test_config(root: &Path) -> Config {
    Config(Box::new(MediaServiceConfig {
        base: BaseConfig {
            server_port: 8091,
            public_host: "localhost".to_string(),
            cors_origins: vec!["*".to_string()],
            http_concurrency_limit: 64,
            db_max_connections: 1,
            db_timeout_seconds: 5,
            jwt_secret: JWT_SECRET.to_string(),
            jwt_issuer: "reelstore-access".to_string(),
            environment: "test".to_string(),
        },
        database_url: None,
        storage_backend: StorageBackend::Local,
        s3_bucket: Some(BUCKET.to_string()),
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(root.join("objects").to_string_lossy().into_owned()),
        local_storage_base_url: Some(BASE_URL.to_string()),
        signing_secret: Some(SIGNING_SECRET.to_string()),
        assets_root: root.join("assets"),
        staging_dir: root.join("staging"),
        max_thumbnail_size_bytes: 1024,
        max_video_size_bytes: 64 * 1024,
        thumbnail_allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        video_allowed_content_types: vec!["video/mp4".to_string()],
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        process_timeout_secs: 5,
    }))
}

/// Setup a test app with a landscape prober and a copying optimizer.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(FakeProber::landscape(), FakeOptimizer::copying()).await
}

pub async fn setup_test_app_with(prober: FakeProber, optimizer: FakeOptimizer) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let root = temp_dir.path().to_path_buf();
    let config = test_config(&root);
    config.validate().expect("test config is valid");

    let assets = Arc::new(InMemoryAssetRepository::new());
    let local = Arc::new(
        LocalStorage::new(root.join("objects"), BASE_URL.to_string(), SIGNING_SECRET)
            .await
            .expect("Failed to create local storage"),
    );
    let asset_store = LocalAssetStore::new(root.join("assets"), "localhost".to_string(), 8091)
        .await
        .expect("Failed to create asset store");
    let staging = StagingArea::new(root.join("staging"))
        .await
        .expect("Failed to create staging area");

    let prober = Arc::new(prober);
    let optimizer = Arc::new(optimizer);
    let storage = Arc::new(FlakyStorage::new(local.clone()));
    let records = Arc::new(FlakyAssets::new(assets.clone()));
    let pipeline = UploadPipeline::new(
        records.clone() as Arc<dyn AssetRepository>,
        storage.clone() as Arc<dyn Storage>,
        asset_store,
        staging,
        prober.clone() as Arc<dyn MediaProber>,
        optimizer.clone() as Arc<dyn StreamOptimizer>,
        PipelineConfig::from_config(&config),
    );

    let jwt = JwtService::new(JWT_SECRET, "reelstore-access");
    let state = Arc::new(AppState {
        config: config.clone(),
        assets: records.clone(),
        pipeline: Arc::new(pipeline),
        jwt: Arc::new(jwt.clone()),
        local_storage: Some(local),
    });

    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        jwt,
        assets,
        prober,
        optimizer,
        storage,
        records,
        _temp_dir: temp_dir,
        root,
    }
}
