use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{ImageStore, StorageError};

/// Writes images into a directory that the server also exposes under
/// `serve_prefix`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    serve_prefix: String,
}

impl LocalImageStore {
    /// Creates the upload directory if it does not exist yet.
    pub async fn new(root: impl Into<PathBuf>, serve_prefix: &str) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;

        Ok(Self {
            root,
            serve_prefix: serve_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, &bytes).await?;

        // served back by extension, the declared type is not persisted
        tracing::debug!(path = %path.display(), size = bytes.len(), content_type, "Stored image on disk");

        Ok(format!("{}/{}", self.serve_prefix, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_upload_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("uploads");

        let store = LocalImageStore::new(&root, "/uploads").await.unwrap();

        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn put_writes_file_and_returns_served_path() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(tmp.path(), "/uploads/").await.unwrap();

        let locator = store
            .put("1700000000000-widget.png", Bytes::from_static(b"\x89PNG"), "image/png")
            .await
            .unwrap();

        assert_eq!(locator, "/uploads/1700000000000-widget.png");
        let written = std::fs::read(tmp.path().join("1700000000000-widget.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn rejects_keys_with_separators() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(tmp.path(), "/uploads").await.unwrap();

        let result = store.put("../escape.png", Bytes::new(), "image/png").await;

        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn delete_removes_file_and_ignores_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(tmp.path(), "/uploads").await.unwrap();
        store.put("1-a.png", Bytes::from_static(b"a"), "image/png").await.unwrap();

        store.delete("1-a.png").await.unwrap();
        store.delete("1-a.png").await.unwrap();

        assert!(!tmp.path().join("1-a.png").exists());
    }
}
