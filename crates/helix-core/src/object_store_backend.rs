//! Cloud object-store backend built on the `object_store` crate.
//!
//! One implementation covers S3 and GCS buckets; credentials are discovered
//! from the environment the way the platform injects them. The bucket string
//! selects the provider: `s3://` prefixes go to S3, everything else to GCS,
//! matching the deployment convention.

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{ObjectMeta, StorageBackend, WritePrecondition, WriteResult};

/// Storage backend for a cloud bucket.
#[derive(Debug, Clone)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStoreBackend {
    /// Creates a backend for the given bucket.
    ///
    /// Accepts `s3://bucket`, `gs://bucket`, or a bare bucket name (treated
    /// as GCS). Credentials come from the standard provider environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket name is empty or the provider client
    /// cannot be constructed.
    pub fn from_bucket(bucket: &str) -> Result<Self> {
        let trimmed = bucket.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("bucket name cannot be empty".into()));
        }

        let store: Arc<dyn ObjectStore> = if let Some(name) = trimmed.strip_prefix("s3://") {
            Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(name)
                    .build()
                    .map_err(|e| Error::storage_with_source("failed to build S3 client", e))?,
            )
        } else {
            let name = trimmed.strip_prefix("gs://").unwrap_or(trimmed);
            Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(name)
                    .build()
                    .map_err(|e| Error::storage_with_source("failed to build GCS client", e))?,
            )
        };

        Ok(Self {
            store,
            bucket: trimmed.to_string(),
        })
    }

    /// Wraps an existing `ObjectStore` implementation.
    #[must_use]
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// Returns the bucket identifier this backend targets.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn convert_meta(meta: &object_store::ObjectMeta) -> ObjectMeta {
    ObjectMeta {
        path: meta.location.to_string(),
        size: meta.size as u64,
        version: meta
            .e_tag
            .clone()
            .or_else(|| meta.version.clone())
            .unwrap_or_default(),
        last_modified: Some(meta.last_modified),
    }
}

#[async_trait]
impl StorageBackend for ObjectStoreBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let location = Path::from(path);
        let result = self.store.get(&location).await.map_err(|e| match e {
            object_store::Error::NotFound { .. } => {
                Error::NotFound(format!("object not found: {path}"))
            }
            other => Error::storage_with_source(format!("get failed for {path}"), other),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| Error::storage_with_source(format!("read failed for {path}"), e))
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let location = Path::from(path);
        let mode = match precondition {
            WritePrecondition::DoesNotExist => PutMode::Create,
            WritePrecondition::None => PutMode::Overwrite,
        };

        let result = self
            .store
            .put_opts(&location, PutPayload::from(data), PutOptions::from(mode))
            .await;

        match result {
            Ok(put) => Ok(WriteResult::Success {
                version: put.e_tag.or(put.version).unwrap_or_default(),
            }),
            Err(object_store::Error::AlreadyExists { .. }) => {
                let current_version = self
                    .store
                    .head(&location)
                    .await
                    .ok()
                    .and_then(|meta| meta.e_tag.or(meta.version))
                    .unwrap_or_default();
                Ok(WriteResult::PreconditionFailed { current_version })
            }
            Err(e) => Err(Error::storage_with_source(
                format!("put failed for {path}"),
                e,
            )),
        }
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let location = Path::from(path);
        match self.store.head(&location).await {
            Ok(meta) => Ok(Some(convert_meta(&meta))),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::storage_with_source(
                format!("head failed for {path}"),
                e,
            )),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let location = Path::from(prefix);
        let metas: Vec<object_store::ObjectMeta> = self
            .store
            .list(Some(&location))
            .try_collect()
            .await
            .map_err(|e| Error::storage_with_source(format!("list failed for {prefix}"), e))?;

        Ok(metas.iter().map(convert_meta).collect())
    }
}
