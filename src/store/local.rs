use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::ObjectStore;

/// Directory-backed store: bucket `b`, key `raw/x.csv` lives at `<root>/b/raw/x.csv`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem path for `bucket`/`key`. Keys may not climb out of the bucket.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        for part in [bucket, key] {
            let escapes = Path::new(part).components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });
            if escapes || part.is_empty() {
                bail!("invalid object location {:?}/{:?}", bucket, key);
            }
        }
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("could not create `{}`", parent.display()))?;
        }

        // write beside the target, then rename, so readers never see half a file
        let mut tmp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| anyhow!("object path {} has no file name", path.display()))?;
        tmp_name.push(".partial");
        let tmp = path.with_file_name(tmp_name);
        fs::write(&tmp, &body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;

        debug!(path = %path.display(), bytes = body.len(), content_type, "stored object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn round_trips_through_nested_dirs() -> Result<()> {
        let tmp = tempdir()?;
        let store = LocalStore::new(tmp.path());
        store
            .put_object("orders", "processed/2024/jan.csv", b"a\r\n".to_vec(), "text/csv")
            .await?;

        assert!(tmp.path().join("orders/processed/2024/jan.csv").is_file());
        assert!(!tmp.path().join("orders/processed/2024/jan.csv.partial").exists());
        assert_eq!(store.get_object("orders", "processed/2024/jan.csv").await?, b"a\r\n");
        Ok(())
    }

    #[tokio::test]
    async fn keys_sharing_a_stem_do_not_share_a_temp_file() -> Result<()> {
        let tmp = tempdir()?;
        let store = LocalStore::new(tmp.path());
        store.put_object("b", "out/x.csv", b"csv".to_vec(), "text/csv").await?;
        store.put_object("b", "out/x.txt", b"txt".to_vec(), "text/plain").await?;
        store.put_object("b", "out/x.partial", b"partial".to_vec(), "text/plain").await?;

        assert_eq!(store.get_object("b", "out/x.csv").await?, b"csv");
        assert_eq!(store.get_object("b", "out/x.txt").await?, b"txt");
        assert_eq!(store.get_object("b", "out/x.partial").await?, b"partial");
        assert!(!tmp.path().join("b/out/x.partial.partial").exists());
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let store = LocalStore::new(tmp.path());
        let err = store.get_object("orders", "raw/none.csv").await.unwrap_err();
        assert!(err.to_string().contains("none.csv"));
    }

    #[test]
    fn rejects_escaping_keys() {
        let store = LocalStore::new("/data");
        assert!(store.object_path("orders", "../secret.csv").is_err());
        assert!(store.object_path("orders", "/etc/passwd").is_err());
        assert!(store.object_path("", "raw/a.csv").is_err());
        assert_eq!(
            store.object_path("orders", "raw/a.csv").unwrap(),
            PathBuf::from("/data/orders/raw/a.csv")
        );
    }
}
