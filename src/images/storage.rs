// Image store: port and local filesystem adapter

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::error::StoreError;

pub const URL_PREFIX: &str = "/uploads";

/// Blob storage for uploaded image bytes
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store the bytes and return the public URL they are served from
    async fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, StoreError>;

    /// Remove the blob behind `url`; a blob that is already gone is not an error
    async fn delete(&self, url: &str) -> Result<(), StoreError>;
}

/// Extension for a stored file, from the original name or the content type
pub fn file_extension(filename: &str, content_type: &str) -> &'static str {
    let from_name = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match from_name.as_deref() {
        Some("jpg") | Some("jpeg") => ".jpg",
        Some("png") => ".png",
        Some("gif") => ".gif",
        Some("webp") => ".webp",
        _ => match content_type {
            "image/jpeg" => ".jpg",
            "image/png" => ".png",
            "image/gif" => ".gif",
            "image/webp" => ".webp",
            _ => ".bin",
        },
    }
}

/// Stores images as `<uuid><ext>` under a directory served at `/uploads`
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a public URL back to a path inside the root, refusing traversal
    fn path_for(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(URL_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains(&['/', '\\'][..]) || name.starts_with('.') {
            return None;
        }
        Some(self.root.join(name))
    }
}

#[async_trait]
impl ImageStorage for LocalFileStorage {
    async fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, StoreError> {
        fs::create_dir_all(&self.root).await?;

        let stored = format!("{}{}", Uuid::new_v4(), file_extension(filename, content_type));
        fs::write(self.root.join(&stored), bytes).await?;

        tracing::debug!("Stored upload {} as {}", filename, stored);
        Ok(format!("{}/{}", URL_PREFIX, stored))
    }

    async fn delete(&self, url: &str) -> Result<(), StoreError> {
        let path = self
            .path_for(url)
            .ok_or_else(|| StoreError::Backend(format!("not a local upload url: {}", url)))?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
