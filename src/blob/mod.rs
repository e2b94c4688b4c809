use async_trait::async_trait;

pub mod memory;
pub mod s3;

pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob upload failed: {0}")]
    Upload(String),
}

/// Stores an image payload and returns its location reference. The store owns
/// the bytes; the catalog only keeps the returned pointer.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, BlobError>;
}
