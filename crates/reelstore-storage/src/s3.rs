use crate::traits::{validate_bucket, validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::{
    Attribute, Attributes, ObjectStore, PutMultipartOptions, PutOptions, PutPayload,
    Result as ObjectResult, WriteMultipart,
};
use reelstore_core::ObjectReference;
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;

/// Files above this size are streamed as a multipart upload.
const MULTIPART_THRESHOLD_BYTES: u64 = 8 * 1024 * 1024;
/// S3 requires every part but the last to be at least 5 MiB.
const MULTIPART_PART_SIZE: usize = 5 * 1024 * 1024;
const MULTIPART_CONCURRENCY: usize = 4;

fn content_type_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    attributes
}

/// Stream a local file to `location` in `part_size` chunks, so memory use
/// stays bounded by the parts in flight. The upload is aborted on any error.
pub(crate) async fn stream_file_multipart(
    store: &dyn ObjectStore,
    location: &Path,
    source: &std::path::Path,
    content_type: &str,
    part_size: usize,
) -> StorageResult<u64> {
    let mut file = tokio::fs::File::open(source).await.map_err(|e| {
        StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
    })?;

    let opts = PutMultipartOptions {
        attributes: content_type_attributes(content_type),
        ..Default::default()
    };
    let upload = store
        .put_multipart_opts(location, opts)
        .await
        .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
    let mut writer = WriteMultipart::new_with_chunk_size(upload, part_size);

    let mut buffer = vec![0u8; part_size];
    let mut total = 0u64;
    loop {
        let read = match file.read(&mut buffer).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                let _ = writer.abort().await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to read {}: {}",
                    source.display(),
                    e
                )));
            }
        };
        if let Err(e) = writer.wait_for_capacity(MULTIPART_CONCURRENCY).await {
            let _ = writer.abort().await;
            return Err(StorageError::UploadFailed(e.to_string()));
        }
        writer.write(&buffer[..read]);
        total += read as u64;
    }

    writer
        .finish()
        .await
        .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
    Ok(total)
}

/// S3 storage implementation
///
/// One `AmazonS3` client is built per bucket on first use and cached.
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: RwLock<HashMap<String, AmazonS3>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `default_bucket` - Bucket whose client is built eagerly so misconfiguration fails at startup
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        default_bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let storage = S3Storage {
            region,
            endpoint_url,
            stores: RwLock::new(HashMap::new()),
        };
        storage.store_for(&default_bucket).await?;
        Ok(storage)
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    async fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        validate_bucket(bucket)?;

        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }
        let store = self.build_store(bucket)?;
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<ObjectReference> {
        validate_key(key)?;
        let store = self
            .store_for(bucket)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let size = data.len() as u64;
        let location = Path::from(key);
        let opts = PutOptions {
            attributes: content_type_attributes(content_type),
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put_opts(&location, PutPayload::from(data), opts)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(ObjectReference::new(bucket, key))
    }

    /// Large files are streamed in parts instead of being read into memory.
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &std::path::Path,
        content_type: &str,
    ) -> StorageResult<ObjectReference> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!("Failed to stat {}: {}", path.display(), e))
            })?
            .len();
        if size <= MULTIPART_THRESHOLD_BYTES {
            let data = tokio::fs::read(path).await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
            })?;
            return self.put(bucket, key, Bytes::from(data), content_type).await;
        }

        validate_key(key)?;
        let store = self
            .store_for(bucket)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        let start = std::time::Instant::now();
        let location = Path::from(key);
        let written =
            stream_file_multipart(&store, &location, path, content_type, MULTIPART_PART_SIZE)
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        error = %e,
                        bucket = %bucket,
                        key = %key,
                        size_bytes = size,
                        "S3 multipart upload failed"
                    );
                })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = written,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 multipart upload successful"
        );

        Ok(ObjectReference::new(bucket, key))
    }

    async fn presigned_url(
        &self,
        reference: &ObjectReference,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(&reference.key)?;
        let store = self
            .store_for(&reference.bucket)
            .await
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        let location = Path::from(reference.key.as_str());
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %reference.bucket,
                    key = %reference.key,
                    "S3 signing failed"
                );
                StorageError::SigningFailed(e.to_string())
            })?
            .to_string();

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
