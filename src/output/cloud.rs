//! Storage locations (local, S3, R2, GCS, Azure)

use crate::config::StorageCredentials;
use crate::error::{Error, Result, ResultExt};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::sync::Arc;

/// A root location in an object store
///
/// Keys passed to its methods are relative to the root, e.g.
/// `song/year=2004/artist_id=AR1/part-00000.parquet`.
#[derive(Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// URL scheme for logging
    scheme: String,
    /// Original URL
    url: String,
}

impl fmt::Debug for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageLocation")
            .field("url", &self.url)
            .field("scheme", &self.scheme)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Split `bucket/some/prefix/` into bucket and trimmed prefix
fn split_bucket(without_scheme: &str) -> (&str, String) {
    match without_scheme.find('/') {
        Some(idx) => (
            &without_scheme[..idx],
            without_scheme[idx + 1..].trim_matches('/').to_string(),
        ),
        None => (without_scheme, String::new()),
    }
}

impl StorageLocation {
    /// Open an existing location for reading
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` or `s3a://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    pub fn open(url: &str, credentials: Option<&StorageCredentials>) -> Result<Self> {
        Self::parse(url, credentials, false)
    }

    /// Open a location for writing, creating a local root directory if needed
    pub fn create(url: &str, credentials: Option<&StorageCredentials>) -> Result<Self> {
        Self::parse(url, credentials, true)
    }

    /// An in-memory location, mainly for tests
    pub fn memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            prefix: String::new(),
            scheme: "memory".to_string(),
            url: "memory://".to_string(),
        }
    }

    fn parse(url: &str, credentials: Option<&StorageCredentials>, create: bool) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            Self::parse_s3(url, rest, "s3", credentials)
        } else if let Some(rest) = url.strip_prefix("s3a://") {
            Self::parse_s3(url, rest, "s3", credentials)
        } else if let Some(rest) = url.strip_prefix("r2://") {
            Self::parse_s3(url, rest, "r2", credentials)
        } else if let Some(rest) = url.strip_prefix("gs://") {
            Self::parse_gcs(url, rest)
        } else if let Some(rest) = url.strip_prefix("az://") {
            Self::parse_azure(url, rest)
        } else {
            Self::parse_local(url, create)
        }
    }

    /// Parse S3 or R2 URL
    fn parse_s3(
        url: &str,
        without_scheme: &str,
        scheme: &str,
        credentials: Option<&StorageCredentials>,
    ) -> Result<Self> {
        let (bucket, prefix) = split_bucket(without_scheme);
        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in URL: {url}")));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        if scheme == "r2" {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        if let Some(creds) = credentials {
            if let (Some(key), Some(secret)) = (&creds.access_key_id, &creds.secret_access_key) {
                builder = builder
                    .with_access_key_id(key)
                    .with_secret_access_key(secret);
            }
            if let Some(token) = &creds.session_token {
                builder = builder.with_token(token);
            }
            if let Some(region) = &creds.region {
                builder = builder.with_region(region);
            }
            if let Some(endpoint) = &creds.endpoint {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: scheme.to_string(),
            url: url.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str, without_scheme: &str) -> Result<Self> {
        let (bucket, prefix) = split_bucket(without_scheme);

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
            url: url.to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str, without_scheme: &str) -> Result<Self> {
        let (container, prefix) = split_bucket(without_scheme);

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
            url: url.to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(url: &str, create: bool) -> Result<Self> {
        let path = url.strip_prefix("file://").unwrap_or(url);

        if create {
            std::fs::create_dir_all(path)
                .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;
        } else if !std::path::Path::new(path).is_dir() {
            return Err(Error::FileNotFound {
                path: path.to_string(),
            });
        }

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
            url: url.to_string(),
        })
    }

    /// Check if this is a cloud location (not local or in-memory)
    pub fn is_cloud(&self) -> bool {
        !matches!(self.scheme.as_str(), "file" | "memory")
    }

    /// Get the scheme (s3, r2, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Get the URL this location was opened with
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Full object path for a relative key
    fn object_path(&self, key: &str) -> Result<ObjectPath> {
        let key = key.trim_matches('/');
        let full = match (self.prefix.is_empty(), key.is_empty()) {
            (true, _) => key.to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{key}", self.prefix),
        };
        ObjectPath::parse(&full).map_err(|e| Error::storage(format!("Invalid key '{full}': {e}")))
    }

    /// Relative key for a full object path
    fn relative_key(&self, path: &ObjectPath) -> String {
        let full = path.as_ref();
        if self.prefix.is_empty() {
            return full.to_string();
        }
        full.strip_prefix(self.prefix.as_str())
            .map_or(full, |rest| rest.trim_start_matches('/'))
            .to_string()
    }

    /// Write bytes to a key
    pub async fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.object_path(key)?;
        self.store
            .put(&path, data.into())
            .await
            .with_context(|| format!("Failed to write {}://{path}", self.scheme))?;
        Ok(())
    }

    /// Read the bytes stored at a key
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.object_path(key)?;
        let result = self
            .store
            .get(&path)
            .await
            .with_context(|| format!("Failed to read {}://{path}", self.scheme))?;
        result
            .bytes()
            .await
            .with_context(|| format!("Failed to read {}://{path}", self.scheme))
    }

    /// List every key below a prefix, sorted
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let path = self.object_path(prefix)?;
        let path = if path.as_ref().is_empty() {
            None
        } else {
            Some(path)
        };

        let objects: Vec<_> = self
            .store
            .list(path.as_ref())
            .try_collect()
            .await
            .with_context(|| format!("Failed to list {}", self.url))?;

        let mut keys: Vec<String> = objects
            .iter()
            .map(|meta| self.relative_key(&meta.location))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Check whether an object exists at a key
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.object_path(key)?;
        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Move an object, replacing anything at the destination
    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from_path = self.object_path(from)?;
        let to_path = self.object_path(to)?;
        self.store
            .rename(&from_path, &to_path)
            .await
            .with_context(|| format!("Failed to move {from_path} to {to_path}"))?;
        Ok(())
    }

    /// Delete the object at a key; a missing object is not an error
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;
        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err::<(), _>(e).context(format!("Failed to delete {path}")),
        }
    }

    /// Delete every object below a prefix, returning how many were removed
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let keys = self.list(prefix).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_bucket() {
        assert_eq!(
            split_bucket("bucket/data/lake/"),
            ("bucket", "data/lake".to_string())
        );
        assert_eq!(split_bucket("bucket"), ("bucket", String::new()));
    }

    #[test]
    fn test_parse_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        let location = StorageLocation::open(path, None).unwrap();
        assert_eq!(location.scheme(), "file");
        assert!(!location.is_cloud());
    }

    #[test]
    fn test_open_missing_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope");
        let result = StorageLocation::open(missing.to_str().unwrap(), None);
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_create_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out = temp_dir.path().join("lake");
        let location = StorageLocation::create(out.to_str().unwrap(), None).unwrap();
        assert!(out.is_dir());
        assert_eq!(location.url(), out.to_str().unwrap());
    }

    #[test]
    fn test_s3a_alias() {
        let creds = StorageCredentials {
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            region: Some("us-west-2".to_string()),
            ..Default::default()
        };
        let location = StorageLocation::open("s3a://udacity-dend/", Some(&creds)).unwrap();
        assert_eq!(location.scheme(), "s3");
        assert!(location.is_cloud());
    }

    #[tokio::test]
    async fn test_memory_roundtrip() {
        let location = StorageLocation::memory();
        location
            .put("song/part-00000.parquet", Bytes::from_static(b"abc"))
            .await
            .unwrap();

        assert!(location.exists("song/part-00000.parquet").await.unwrap());
        assert!(!location.exists("artist/part-00000.parquet").await.unwrap());
        assert_eq!(
            location.get("song/part-00000.parquet").await.unwrap(),
            Bytes::from_static(b"abc")
        );
        assert_eq!(
            location.list("song").await.unwrap(),
            vec!["song/part-00000.parquet".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rename_and_delete_prefix() {
        let location = StorageLocation::memory();
        location.put("a/1", Bytes::from_static(b"1")).await.unwrap();
        location.put("a/2", Bytes::from_static(b"2")).await.unwrap();

        location.rename("a/1", "b/1").await.unwrap();
        assert_eq!(location.list("b").await.unwrap(), vec!["b/1".to_string()]);

        assert_eq!(location.delete_prefix("a").await.unwrap(), 1);
        assert!(location.list("a").await.unwrap().is_empty());

        // deleting something absent is fine
        location.delete("a/2").await.unwrap();
    }
}
