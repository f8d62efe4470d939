use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

/// Output port: byte storage for photo content, keyed by plain file name.
#[async_trait]
pub trait PhotoContentStore: Send + Sync {
    /// Create or overwrite `filename` with `content`.
    async fn write(&self, filename: &str, content: Bytes) -> anyhow::Result<()>;
    /// Open `filename` for streaming reads.
    async fn open(&self, filename: &str) -> anyhow::Result<Box<dyn AsyncRead + Send + Unpin>>;
}
