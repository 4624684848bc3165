//! File storage backed by an S3-compatible object store
//!
//! The provider owns everything past the upload call (including any
//! re-encoding); this service only moves bytes and derives public URLs.

use crate::{config::StorageConfig, error::AppError};
use s3::{creds::Credentials, Bucket, Region};
use secrecy::ExposeSecret;

/// What an upload hands back: the stored name and the public URL.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub url: String,
}

pub struct StorageService {
    bucket: Bucket,
    bucket_name: String,
    endpoint: Option<String>,
    public_url: Option<String>,
}

impl StorageService {
    pub fn from_config(config: &StorageConfig) -> Result<Self, AppError> {
        let region: Region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| AppError::Config(format!("invalid storage region: {:?}", e)))?,
        };

        let credentials = Credentials::new(
            config.access_key.as_ref().map(|k| k.expose_secret().as_str()),
            config.secret_key.as_ref().map(|k| k.expose_secret().as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Config(format!("invalid storage credentials: {}", e)))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| AppError::Config(format!("failed to create storage bucket: {}", e)))?;

        // Compatible services (MinIO etc.) want path-style addressing
        if config.endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            bucket_name: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
            public_url: config.public_url.clone(),
        })
    }

    /// Upload a file under `path/name`.
    pub async fn upload(
        &self,
        bytes: &[u8],
        content_type: &str,
        path: &str,
        name: &str,
    ) -> Result<StoredFile, AppError> {
        let key = object_key(path, name);

        self.bucket
            .put_object_with_content_type(&key, bytes, content_type)
            .await
            .map_err(|e| {
                tracing::error!(key = %key, "Upload failed: {}", e);
                AppError::Storage(e.to_string())
            })?;

        tracing::debug!(key = %key, size = bytes.len(), "File uploaded");

        Ok(StoredFile {
            name: name.to_string(),
            url: self.object_url(&key),
        })
    }

    /// Remove a stored object.
    pub async fn remove(&self, path: &str, name: &str) -> Result<(), AppError> {
        let key = object_key(path, name);

        self.bucket.delete_object(&key).await.map_err(|e| {
            tracing::error!(key = %key, "Delete failed: {}", e);
            AppError::Storage(e.to_string())
        })?;

        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        if let Some(base) = &self.public_url {
            return format!("{}/{}", base.trim_end_matches('/'), key);
        }
        match &self.endpoint {
            Some(endpoint) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket_name, key)
            }
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket_name, key),
        }
    }
}

fn object_key(path: &str, name: &str) -> String {
    format!("{}/{}", path.trim_matches('/'), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests_support::test_config;
    use secrecy::Secret;

    fn test_storage_config() -> StorageConfig {
        let mut config = test_config().storage;
        config.access_key = Some(Secret::new("test-access-key".to_string()));
        config.secret_key = Some(Secret::new("test-secret-key".to_string()));
        config
    }

    #[test]
    fn test_object_key_normalizes_path() {
        assert_eq!(object_key("avatars", "a.png"), "avatars/a.png");
        assert_eq!(object_key("/projects/42/", "b.webp"), "projects/42/b.webp");
    }

    #[test]
    fn test_object_url_prefers_public_base() {
        let mut config = test_storage_config();
        config.public_url = Some("https://files.example.com/".to_string());
        let storage = StorageService::from_config(&config).unwrap();

        assert_eq!(
            storage.object_url("avatars/a.png"),
            "https://files.example.com/avatars/a.png"
        );
    }

    #[test]
    fn test_object_url_from_custom_endpoint() {
        let mut config = test_storage_config();
        config.endpoint = Some("http://localhost:9000".to_string());
        let storage = StorageService::from_config(&config).unwrap();

        assert_eq!(
            storage.object_url("avatars/a.png"),
            "http://localhost:9000/portfolio-test/avatars/a.png"
        );
    }
}
