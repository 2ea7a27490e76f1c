use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::blob_store::{BlobStore, GcsStore, LocalStore};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the local storage backend
    pub local_storage_path: String,
    /// URL prefix under which the local storage directory is served
    pub public_base_url: String,
    /// GCS bucket name (required when backend is gcs)
    pub gcs_bucket: Option<String>,
    /// Path to GCS service account JSON (optional, defaults to ADC)
    pub gcs_credentials_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./storage".to_string(),
            public_base_url: "/storage".to_string(),
            gcs_bucket: None,
            gcs_credentials_file: None,
        }
    }
}

impl StorageConfig {
    /// Load storage configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./storage".to_string());

        let public_base_url =
            std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "/storage".to_string());

        let gcs_bucket = std::env::var("GCS_BUCKET").ok();
        let gcs_credentials_file = std::env::var("GCS_CREDENTIALS_FILE").ok();

        let config = StorageConfig {
            backend,
            local_storage_path,
            public_base_url,
            gcs_bucket,
            gcs_credentials_file,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.backend, StorageBackend::Gcs) && self.gcs_bucket.is_none() {
            return Err(ConfigError::ValidationError(
                "GCS_BUCKET is required when STORAGE_BACKEND=gcs".to_string(),
            ));
        }

        Ok(())
    }

    /// Construct the configured blob store backend.
    pub async fn build_store(&self) -> Result<Arc<dyn BlobStore>, anyhow::Error> {
        match self.backend {
            StorageBackend::Local => {
                let store = LocalStore::new(&self.local_storage_path, &self.public_base_url)?;
                info!(
                    "Using local storage backend at: {}",
                    self.local_storage_path
                );
                Ok(Arc::new(store))
            }
            StorageBackend::Gcs => {
                let bucket = self
                    .gcs_bucket
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("GCS_BUCKET is required"))?;
                let store = GcsStore::new(bucket, self.gcs_credentials_file.as_deref()).await?;
                info!("Using GCS storage backend, bucket: {}", bucket);
                Ok(Arc::new(store))
            }
        }
    }
}
