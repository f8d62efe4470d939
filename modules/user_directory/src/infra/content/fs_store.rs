use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

use crate::domain::ports::PhotoContentStore;

/// Photo bytes as plain files under one root directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if missing.
    pub async fn ensure_root(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("cannot create photo dir {}", self.root.display()))
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

#[async_trait]
impl PhotoContentStore for FsContentStore {
    async fn write(&self, filename: &str, content: Bytes) -> anyhow::Result<()> {
        let path = self.path_for(filename);
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("cannot create {}", path.display()))?;
        file.write_all(&content)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        file.flush().await?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote photo content");
        Ok(())
    }

    async fn open(&self, filename: &str) -> anyhow::Result<Box<dyn AsyncRead + Send + Unpin>> {
        let path = self.path_for(filename);
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn written_bytes_read_back() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(tmp.path().join("photos"));
        store.ensure_root().await.unwrap();

        store
            .write("me.png", Bytes::from_static(b"\x89PNG-data"))
            .await
            .unwrap();

        let mut reader = store.open("me.png").await.unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"\x89PNG-data");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(tmp.path());
        assert!(store.open("absent.png").await.is_err());
    }

    #[tokio::test]
    async fn write_into_missing_root_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(tmp.path().join("never-created"));
        assert!(store.write("x.png", Bytes::new()).await.is_err());
    }
}
