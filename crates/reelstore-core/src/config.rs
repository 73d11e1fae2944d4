//! Configuration module
//!
//! Loads the server, storage and media pipeline settings from the environment
//! (with `.env` support) into an immutable `Config`.

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const JWT_ISSUER: &str = "reelstore-access";
const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
const MAX_VIDEO_SIZE_MB: u64 = 1024;
/// Upper bound for either upload size setting (64 GiB).
const MAX_UPLOAD_SIZE_BYTES: u64 = 64 * 1024 * MIB;
const MIB: u64 = 1024 * 1024;
const PROCESS_TIMEOUT_SECS: u64 = 300;
const MIN_SECRET_LEN: usize = 32;
const LOCAL_BUCKET: &str = "reelstore";

/// Media types the key deriver can name. Allow-lists must stay within this set.
pub const KNOWN_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "video/mp4",
    "video/quicktime",
    "video/webm",
];

const SHELL_METACHARACTERS: &[char] = &[';', '&', '|', '`', '$', '(', ')', '<', '>', '\n'];

/// Settings shared by every service binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub public_host: String,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub environment: String,
}

/// Media service configuration
#[derive(Clone, Debug)]
pub struct MediaServiceConfig {
    pub base: BaseConfig,
    pub database_url: Option<String>,
    // Object storage
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub signing_secret: Option<String>,
    // Local paths
    pub assets_root: PathBuf,
    pub staging_dir: PathBuf,
    // Upload limits
    pub max_thumbnail_size_bytes: u64,
    pub max_video_size_bytes: u64,
    pub thumbnail_allowed_content_types: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    // External tools
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub process_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaServiceConfig>);

impl Config {
    fn as_media(&self) -> &MediaServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_media().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_media().base.server_port
    }

    pub fn public_host(&self) -> &str {
        &self.as_media().base.public_host
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_media().base.cors_origins
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_media().base.http_concurrency_limit
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_media().base.jwt_secret
    }

    pub fn jwt_issuer(&self) -> &str {
        &self.as_media().base.jwt_issuer
    }

    pub fn environment(&self) -> &str {
        &self.as_media().base.environment
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_media().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_media().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_media().base.db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_media().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_media().s3_bucket.as_deref()
    }

    /// Bucket videos are uploaded to. The local backend falls back to a fixed
    /// directory name when `S3_BUCKET` is unset.
    pub fn upload_bucket(&self) -> &str {
        self.s3_bucket().unwrap_or(LOCAL_BUCKET)
    }

    /// `S3_REGION` wins over `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.as_media()
            .s3_region
            .as_deref()
            .or(self.as_media().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_media().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_media().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_media().local_storage_base_url.as_deref()
    }

    pub fn signing_secret(&self) -> Option<&str> {
        self.as_media().signing_secret.as_deref()
    }

    pub fn assets_root(&self) -> &PathBuf {
        &self.as_media().assets_root
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.as_media().staging_dir
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.as_media().max_thumbnail_size_bytes
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.as_media().max_video_size_bytes
    }

    pub fn thumbnail_allowed_content_types(&self) -> &[String] {
        &self.as_media().thumbnail_allowed_content_types
    }

    pub fn video_allowed_content_types(&self) -> &[String] {
        &self.as_media().video_allowed_content_types
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_media().ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_media().ffprobe_path
    }

    pub fn process_timeout_secs(&self) -> u64 {
        self.as_media().process_timeout_secs
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

impl MediaServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            public_host: env::var("PUBLIC_HOST").unwrap_or_else(|_| "localhost".to_string()),
            cors_origins,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| JWT_ISSUER.to_string()),
            environment,
        };

        let storage_backend = match non_empty_var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let max_thumbnail_size_mb = env::var("MAX_THUMBNAIL_SIZE_MB")
            .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_THUMBNAIL_SIZE_MB);

        let max_video_size_mb = env::var("MAX_VIDEO_SIZE_MB")
            .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        let config = MediaServiceConfig {
            base,
            database_url: non_empty_var("DATABASE_URL"),
            storage_backend,
            s3_bucket: non_empty_var("S3_BUCKET"),
            s3_region: non_empty_var("S3_REGION"),
            s3_endpoint: non_empty_var("S3_ENDPOINT"),
            aws_region: non_empty_var("AWS_REGION"),
            local_storage_path: non_empty_var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty_var("LOCAL_STORAGE_BASE_URL"),
            signing_secret: non_empty_var("SIGNING_SECRET"),
            assets_root: PathBuf::from(
                env::var("ASSETS_ROOT").unwrap_or_else(|_| "./assets".to_string()),
            ),
            staging_dir: non_empty_var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            max_thumbnail_size_bytes: max_thumbnail_size_mb.saturating_mul(MIB),
            max_video_size_bytes: max_video_size_mb.saturating_mul(MIB),
            thumbnail_allowed_content_types: parse_list(
                &env::var("THUMBNAIL_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| "image/jpeg,image/png".to_string()),
            ),
            video_allowed_content_types: parse_list(
                &env::var("VIDEO_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| "video/mp4".to_string()),
            ),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            process_timeout_secs: env::var("PROCESS_TIMEOUT_SECS")
                .unwrap_or_else(|_| PROCESS_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(PROCESS_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                match &self.signing_secret {
                    Some(secret) if secret.len() >= MIN_SECRET_LEN => {}
                    _ => {
                        return Err(anyhow::anyhow!(
                            "SIGNING_SECRET must be at least 32 characters long when using local storage backend"
                        ))
                    }
                }
            }
        }

        for (name, path) in [
            ("FFMPEG_PATH", &self.ffmpeg_path),
            ("FFPROBE_PATH", &self.ffprobe_path),
        ] {
            if path.is_empty() || path.contains(SHELL_METACHARACTERS) {
                return Err(anyhow::anyhow!("{} contains invalid characters", name));
            }
        }

        for (name, bytes) in [
            ("MAX_THUMBNAIL_SIZE_MB", self.max_thumbnail_size_bytes),
            ("MAX_VIDEO_SIZE_MB", self.max_video_size_bytes),
        ] {
            if bytes == 0 || bytes > MAX_UPLOAD_SIZE_BYTES {
                return Err(anyhow::anyhow!(
                    "{} must be between 1 and {} MiB",
                    name,
                    MAX_UPLOAD_SIZE_BYTES / MIB
                ));
            }
        }

        if self.process_timeout_secs == 0 {
            return Err(anyhow::anyhow!("PROCESS_TIMEOUT_SECS must be greater than 0"));
        }

        for content_type in self
            .thumbnail_allowed_content_types
            .iter()
            .chain(self.video_allowed_content_types.iter())
        {
            if !KNOWN_MEDIA_TYPES.contains(&content_type.as_str()) {
                return Err(anyhow::anyhow!(
                    "Unsupported media type in allow-list: {}",
                    content_type
                ));
            }
        }

        if self
            .thumbnail_allowed_content_types
            .iter()
            .any(|t| !t.starts_with("image/"))
        {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_ALLOWED_CONTENT_TYPES may only contain image types"
            ));
        }

        if self
            .video_allowed_content_types
            .iter()
            .any(|t| !t.starts_with("video/"))
        {
            return Err(anyhow::anyhow!(
                "VIDEO_ALLOWED_CONTENT_TYPES may only contain video types"
            ));
        }

        Ok(())
    }
}
