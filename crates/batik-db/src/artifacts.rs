//! Artifact storage for uploaded prediction images.
//!
//! [`ArtifactStore`] generates collision-free keys and delegates the bytes to a
//! [`StorageBackend`]:
//! - [`FilesystemBackend`]: local directory, atomic temp+rename writes
//! - [`S3Backend`]: S3-compatible object storage via the AWS SDK
//!
//! Key format: `predictions/{owner}/{unix-millis}-{uuid}.{ext}`

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use batik_core::{defaults, Error, Result, StorageBackend};

/// Locator of a committed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    pub key: String,
    pub url: String,
}

// =============================================================================
// ARTIFACT STORE
// =============================================================================

/// Blob store adapter: puts and deletes image artifacts under generated keys.
#[derive(Clone)]
pub struct ArtifactStore {
    backend: Arc<dyn StorageBackend>,
}

impl ArtifactStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Write `data` under a fresh key. Every call generates a new key, so a
    /// retried put never collides with an earlier partial write.
    pub async fn put(&self, owner_id: Uuid, data: &[u8], file_name: &str) -> Result<StoredArtifact> {
        let (extension, content_type) = detect_image_type(data, file_name);
        let key = generate_artifact_key(owner_id, &extension);

        self.backend.write(&key, data, &content_type).await?;

        debug!(
            subsystem = "storage",
            component = "artifacts",
            op = "put",
            backend = self.backend.backend_type(),
            artifact_key = %key,
            size = data.len(),
            "Artifact written"
        );

        Ok(StoredArtifact {
            url: self.backend.public_url(&key),
            key,
        })
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.backend.delete(key).await
    }

    /// Resolve the key of a stored artifact URL. `None` for foreign URLs.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        self.backend.key_from_url(url)
    }
}

/// Generate a unique artifact key for `owner_id`.
pub fn generate_artifact_key(owner_id: Uuid, extension: &str) -> String {
    format!(
        "{}/{}/{}-{}.{}",
        defaults::ARTIFACT_PREFIX,
        owner_id,
        Utc::now().timestamp_millis(),
        Uuid::new_v4(),
        extension
    )
}

/// Resolve `(extension, content type)` from magic bytes, falling back to the
/// caller-supplied file name and finally to JPEG.
pub fn detect_image_type(data: &[u8], file_name: &str) -> (String, String) {
    if let Some(kind) = infer::get(data) {
        if kind.matcher_type() == infer::MatcherType::Image {
            return (kind.extension().to_string(), kind.mime_type().to_string());
        }
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "jpg".to_string());
    let content_type = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        other => format!("image/{}", other),
    };
    (extension, content_type)
}

/// Reject keys that could escape a storage root.
fn validate_key(key: &str) -> Result<()> {
    let safe = !key.is_empty()
        && Path::new(key)
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid artifact key: {}", key)))
    }
}

// =============================================================================
// FILESYSTEM BACKEND
// =============================================================================

/// Filesystem storage backend serving artifacts under a public base URL.
pub struct FilesystemBackend {
    base_path: PathBuf,
    public_base_url: String,
}

impl FilesystemBackend {
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn full_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    /// Round-trip a probe file to catch permission or mount problems at startup.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join(".health-check");
        let test_file = test_dir.join("probe.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

async fn write_and_rename(temp_path: &Path, full_path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(temp_path)
        .await
        .map_err(|e| Error::Storage(format!("create {}: {}", temp_path.display(), e)))?;
    file.write_all(data)
        .await
        .map_err(|e| Error::Storage(format!("write: {}", e)))?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, full_path).await.map_err(|e| {
        warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "artifacts: rename failed");
        Error::Storage(format!("rename: {}", e))
    })
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, key: &str, data: &[u8], _content_type: &str) -> Result<()> {
        let full_path = self.full_path(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "artifacts: create_dir_all failed");
                Error::Storage(format!("create_dir_all: {}", e))
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        if let Err(e) = write_and_rename(&temp_path, &full_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.full_path(key)?;
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path)
                .await
                .map_err(|e| Error::Storage(format!("remove {}: {}", key, e)))?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.full_path(key)?;
        Ok(fs::try_exists(full_path).await?)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| validate_key(key).is_ok())
            .map(str::to_string)
    }

    fn backend_type(&self) -> &'static str {
        "filesystem"
    }
}

// =============================================================================
// S3 BACKEND
// =============================================================================

/// S3-compatible object storage backend.
pub struct S3Backend {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl std::fmt::Debug for S3Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Backend")
            .field("bucket", &self.bucket)
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

impl S3Backend {
    /// Build a client from the ambient AWS configuration.
    ///
    /// With an explicit `endpoint` (MinIO and friends) path-style addressing is
    /// used and public URLs become `{endpoint}/{bucket}/{key}`; otherwise URLs
    /// are virtual-hosted `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
    pub async fn new(bucket: &str, region: &str, endpoint: Option<String>) -> Result<Self> {
        if bucket.trim().is_empty() {
            return Err(Error::Config("S3 bucket name is empty".to_string()));
        }

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        let normalized_endpoint = endpoint.map(|url| {
            let url = url.trim_end_matches('/').to_string();
            if url.starts_with("http://") || url.starts_with("https://") {
                url
            } else {
                format!("http://{}", url)
            }
        });
        if let Some(url) = &normalized_endpoint {
            builder = builder.endpoint_url(url).force_path_style(true);
        }

        let public_base_url = match &normalized_endpoint {
            Some(url) => format!("{}/{}", url, bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
            public_base_url,
        })
    }
}

fn s3_error<E>(op: &str, err: aws_sdk_s3::error::SdkError<E>) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    Error::Storage(format!("S3 {} failed: {}", op, err))
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn write(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(Bytes::copy_from_slice(data)))
            .send()
            .await
            .map_err(|e| s3_error("put_object", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error("delete_object", e))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if let aws_sdk_s3::error::SdkError::ServiceError(ref service_err) = err {
                    if service_err.raw().status().as_u16() == 404 {
                        return Ok(false);
                    }
                }
                Err(s3_error("head_object", err))
            }
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }

    fn backend_type(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_generate_key_format() {
        let owner = Uuid::new_v4();
        let key = generate_artifact_key(owner, "png");
        let prefix = format!("predictions/{}/", owner);
        assert!(key.starts_with(&prefix));
        assert!(key.ends_with(".png"));
        let name = key.trim_start_matches(&prefix);
        let (millis, _) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
    }

    #[test]
    fn test_generate_key_unique() {
        let owner = Uuid::new_v4();
        assert_ne!(
            generate_artifact_key(owner, "jpg"),
            generate_artifact_key(owner, "jpg")
        );
    }

    #[test]
    fn test_detect_from_magic_bytes() {
        let (ext, ct) = detect_image_type(PNG_MAGIC, "photo.jpg");
        assert_eq!(ext, "png");
        assert_eq!(ct, "image/png");
    }

    #[test]
    fn test_detect_falls_back_to_file_name() {
        let (ext, ct) = detect_image_type(b"not an image", "Photo.WEBP");
        assert_eq!(ext, "webp");
        assert_eq!(ct, "image/webp");
    }

    #[test]
    fn test_detect_defaults_to_jpeg() {
        let (ext, ct) = detect_image_type(b"????", "no-extension");
        assert_eq!(ext, "jpg");
        assert_eq!(ct, "image/jpeg");

        let (ext, _) = detect_image_type(b"????", "weird.j/p");
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("predictions/a/b.jpg").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_filesystem_url_round_trip() {
        let backend = FilesystemBackend::new("/tmp/x", "http://localhost:3000/artifacts/");
        let url = backend.public_url("predictions/u/1-a.jpg");
        assert_eq!(url, "http://localhost:3000/artifacts/predictions/u/1-a.jpg");
        assert_eq!(
            backend.key_from_url(&url).as_deref(),
            Some("predictions/u/1-a.jpg")
        );
        assert!(backend.key_from_url("https://elsewhere/x.jpg").is_none());
        assert!(backend
            .key_from_url("http://localhost:3000/artifacts/../secret")
            .is_none());
    }

    #[tokio::test]
    async fn test_filesystem_write_exists_delete() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path(), "http://h/a");

        backend
            .write("predictions/o/1-x.png", PNG_MAGIC, "image/png")
            .await
            .unwrap();
        assert!(backend.exists("predictions/o/1-x.png").await.unwrap());
        let on_disk = std::fs::read(dir.path().join("predictions/o/1-x.png")).unwrap();
        assert_eq!(on_disk, PNG_MAGIC);

        backend.delete("predictions/o/1-x.png").await.unwrap();
        assert!(!backend.exists("predictions/o/1-x.png").await.unwrap());

        // Deleting again is a no-op
        backend.delete("predictions/o/1-x.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path(), "http://h/a");

        // A non-empty directory at the target makes the rename fail
        let target = dir.path().join("predictions/o/1-x.png");
        std::fs::create_dir_all(target.join("occupied")).unwrap();

        let err = backend
            .write("predictions/o/1-x.png", PNG_MAGIC, "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(!dir.path().join("predictions/o/1-x.tmp").exists());
    }

    #[tokio::test]
    async fn test_filesystem_validate() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path(), "http://h/a");
        assert!(backend.validate().await.is_ok());
    }

    #[tokio::test]
    async fn test_store_put_returns_resolvable_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(Arc::new(FilesystemBackend::new(
            dir.path(),
            "http://h/artifacts",
        )));
        let owner = Uuid::new_v4();

        let stored = store.put(owner, PNG_MAGIC, "scan.jpg").await.unwrap();
        assert!(stored.key.ends_with(".png"));
        assert_eq!(store.key_from_url(&stored.url).as_deref(), Some(stored.key.as_str()));
        assert!(store.backend().exists(&stored.key).await.unwrap());

        store.delete(&stored.key).await.unwrap();
        assert!(!store.backend().exists(&stored.key).await.unwrap());
    }
}
