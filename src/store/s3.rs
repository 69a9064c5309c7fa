use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{primitives::ByteStream, Client};
use tracing::debug;

use super::ObjectStore;

/// S3-backed store. Build it once per process and share it across invocations.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from the ambient AWS configuration (env, profile, instance role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("reading s3://{}/{}", bucket, key))?;
        let body = resp
            .body
            .collect()
            .await
            .with_context(|| format!("reading body of s3://{}/{}", bucket, key))?
            .into_bytes()
            .to_vec();
        debug!(bucket, key, bytes = body.len(), "fetched object");
        Ok(body)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let len = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("writing s3://{}/{}", bucket, key))?;
        debug!(bucket, key, bytes = len, "stored object");
        Ok(())
    }
}
