// ABOUTME: Storage for uploaded story cover images, keyed by generated file names.
// ABOUTME: LocalImageStore stages writes beside the publicly served directory, then renames them in.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use ulid::Ulid;

/// Errors that can occur while storing an uploaded image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("image is empty")]
    Empty,

    #[error("image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// A stored image, addressed by its file name inside the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
}

/// Object storage for cover images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, ImageError>;
}

/// Map an image MIME type to the file extension it is stored under.
/// Parameters after `;` and letter case are ignored.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Image store backed by a local directory.
///
/// Partial writes land in a sibling staging directory (`<root>.staging`), so
/// only complete files ever appear under `root`.
pub struct LocalImageStore {
    root: PathBuf,
    staging: PathBuf,
    max_bytes: usize,
}

impl LocalImageStore {
    /// Create the store, making the root and staging directories if they do not exist.
    pub fn new(root: PathBuf, max_bytes: usize) -> Result<Self, ImageError> {
        std::fs::create_dir_all(&root)?;
        let staging = staging_dir_for(&std::fs::canonicalize(&root)?);
        std::fs::create_dir_all(&staging)?;
        Ok(Self {
            root,
            staging,
            max_bytes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, bytes: Vec<u8>, content_type: &str) -> Result<StoredImage, ImageError> {
        let ext = extension_for(content_type)
            .ok_or_else(|| ImageError::UnsupportedType(content_type.to_string()))?;
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(ImageError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let key = format!("{}.{}", Ulid::new().to_string().to_lowercase(), ext);
        let final_path = self.root.join(&key);
        // Staging shares the root's parent, so the rename stays on one filesystem.
        let tmp_path = self.staging.join(format!("{}.tmp", key));

        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::info!(key = %key, size = bytes.len(), "stored cover image");
        Ok(StoredImage { key })
    }
}

fn staging_dir_for(root: &Path) -> PathBuf {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "uploads".to_string());
    root.with_file_name(format!("{name}.staging"))
}
