pub mod local;
pub mod memory;
pub mod s3;

use anyhow::Result;
use async_trait::async_trait;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

/// Whole-object reads and writes against a bucket/key namespace.
/// `put_object` either stores the full body or fails; there are no partial writes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
}
