use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::config::config;
use crate::error::ApiError;

pub const KYC_FOLDER: &str = "kyc";
pub const BANNERS_FOLDER: &str = "banners";

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("Invalid stored path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FileStoreError> for ApiError {
    fn from(err: FileStoreError) -> Self {
        match err {
            FileStoreError::TooLarge { .. } => ApiError::payload_too_large(err.to_string()),
            FileStoreError::InvalidPath(_) => ApiError::bad_request(err.to_string()),
            FileStoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ApiError::not_found("File not found")
            }
            FileStoreError::Io(e) => {
                tracing::error!("File store I/O error: {}", e);
                ApiError::internal_server_error("An error occurred while handling the file")
            }
        }
    }
}

/// A saved blob, addressed by a path relative to the store root.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub stored_path: String,
    pub size_bytes: i64,
}

/// Blob storage seam. The API only ever sees relative stored paths, so
/// swapping the local disk for an object store stays a local change.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(
        &self,
        folder: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, FileStoreError>;

    async fn read(&self, stored_path: &str) -> Result<Vec<u8>, FileStoreError>;

    async fn delete(&self, stored_path: &str) -> Result<(), FileStoreError>;
}

pub struct LocalFileStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self { root: root.into(), max_bytes }
    }

    pub fn from_config() -> Self {
        let cfg = config();
        Self::new(&cfg.storage.root_dir, cfg.api.max_upload_bytes)
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, FileStoreError> {
        let relative = Path::new(stored_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || stored_path.is_empty() {
            return Err(FileStoreError::InvalidPath(stored_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(
        &self,
        folder: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, FileStoreError> {
        if bytes.len() > self.max_bytes {
            return Err(FileStoreError::TooLarge { limit: self.max_bytes });
        }

        let mut name = Uuid::new_v4().simple().to_string();
        if let Some(ext) = sanitized_extension(original_name) {
            name.push('.');
            name.push_str(&ext);
        }

        let stored_path = format!("{}/{}", folder, name);
        let full = self.resolve(&stored_path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;

        Ok(StoredFile {
            stored_path,
            size_bytes: bytes.len() as i64,
        })
    }

    async fn read(&self, stored_path: &str) -> Result<Vec<u8>, FileStoreError> {
        let full = self.resolve(stored_path)?;
        Ok(tokio::fs::read(&full).await?)
    }

    async fn delete(&self, stored_path: &str) -> Result<(), FileStoreError> {
        let full = self.resolve(stored_path)?;
        tokio::fs::remove_file(&full).await?;
        Ok(())
    }
}

/// Keep only short alphanumeric extensions; anything else is dropped so
/// uploaded names can never influence the path.
fn sanitized_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store(max_bytes: usize) -> LocalFileStore {
        let root = std::env::temp_dir().join(format!("iskolar-test-{}", Uuid::new_v4().simple()));
        LocalFileStore::new(root, max_bytes)
    }

    #[tokio::test]
    async fn save_and_read_round_trip() {
        let store = scratch_store(1024);
        let saved = store.save(KYC_FOLDER, "passport.PNG", b"fake-image").await.unwrap();

        assert!(saved.stored_path.starts_with("kyc/"));
        assert!(saved.stored_path.ends_with(".png"));
        assert_eq!(saved.size_bytes, 10);

        let bytes = store.read(&saved.stored_path).await.unwrap();
        assert_eq!(bytes, b"fake-image");

        store.delete(&saved.stored_path).await.unwrap();
        assert!(store.read(&saved.stored_path).await.is_err());
    }

    #[tokio::test]
    async fn oversized_uploads_are_refused() {
        let store = scratch_store(4);
        let result = store.save(KYC_FOLDER, "id.jpg", b"too big").await;
        assert!(matches!(result, Err(FileStoreError::TooLarge { limit: 4 })));
    }

    #[tokio::test]
    async fn traversal_paths_are_refused() {
        let store = scratch_store(1024);
        assert!(matches!(
            store.read("../etc/passwd").await,
            Err(FileStoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.read("/etc/passwd").await,
            Err(FileStoreError::InvalidPath(_))
        ));
        assert!(matches!(store.read("").await, Err(FileStoreError::InvalidPath(_))));
    }

    #[test]
    fn extensions_are_sanitized() {
        assert_eq!(sanitized_extension("photo.JPG"), Some("jpg".to_string()));
        assert_eq!(sanitized_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(sanitized_extension("no-extension"), None);
        assert_eq!(sanitized_extension("weird.j/pg"), None);
        assert_eq!(sanitized_extension("long.verylongext1"), None);
    }

    #[test]
    fn too_large_maps_to_payload_too_large() {
        let api: ApiError = FileStoreError::TooLarge { limit: 10 }.into();
        assert_eq!(api.status_code(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    }
}
