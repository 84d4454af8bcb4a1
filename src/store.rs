//! Object storage seam.
//!
//! The pipeline reads inputs and writes outputs through [`ObjectStore`];
//! the deployment decides what actually sits behind it. [`FsObjectStore`]
//! maps buckets to subdirectories of a root path, which is enough for the
//! CLI and for tests.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;

/// Durable object storage: opaque bytes under `bucket/key`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read a whole object.
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Upload a local file as an object, replacing any previous version.
    async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError>;
}

/// Directory-backed store: `root/bucket/key`.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, key);
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            io::ErrorKind::PermissionDenied => StoreError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => StoreError::Backend(e.to_string()),
        })
    }

    async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), StoreError> {
        let dest = self.object_path(bucket, key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        // Stage next to the destination and rename, so a reader never sees
        // a half-written object. The staging name carries a fresh UUID so
        // concurrent puts never write through the same staging path.
        let staged = dest.with_extension(format!("{}.upload-part", Uuid::new_v4()));
        let map = |e: io::Error| match e.kind() {
            io::ErrorKind::PermissionDenied => StoreError::AccessDenied {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => StoreError::Backend(e.to_string()),
        };
        tokio::fs::copy(local_path, &staged).await.map_err(map)?;
        tokio::fs::rename(&staged, &dest).await.map_err(map)?;
        Ok(())
    }
}
