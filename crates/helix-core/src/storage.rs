//! Storage backend abstraction for the shared object store.
//!
//! The object store is the only shared mutable resource in the pipeline:
//! handlers never talk to each other directly, they coordinate through durable
//! keys here. The contract deliberately exposes cloud object-store semantics
//! (single-key puts, no cross-key transactions) so handler code cannot come to
//! depend on guarantees the production store does not offer.
//!
//! Version tokens are opaque strings: GCS generations, S3 `ETag`s, and the
//! memory backend's counter all fit the same shape.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

/// Precondition for a write.
#[derive(Debug, Clone)]
pub enum WritePrecondition {
    /// Write only if the key does not exist.
    ///
    /// Used for staging writes: a freshly minted object ID must never land on
    /// an existing key.
    DoesNotExist,
    /// Write unconditionally, replacing any prior object.
    ///
    /// Used for status records, where last-writer-wins is the documented
    /// consistency model.
    None,
}

/// Result of a conditional write.
#[derive(Debug, Clone)]
pub enum WriteResult {
    /// Write succeeded, returns the new version token.
    Success {
        /// The new version token after the write.
        version: String,
    },
    /// Precondition failed; the object was left untouched.
    PreconditionFailed {
        /// The version that caused the precondition to fail.
        current_version: String,
    },
}

impl WriteResult {
    /// Returns true if the write was applied.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Metadata about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    /// Object key.
    pub path: String,
    /// Object size in bytes.
    pub size: u64,
    /// Opaque version token.
    pub version: String,
    /// Last modification timestamp.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Storage backend trait for the pipeline's object store.
///
/// All backends (cloud buckets, memory) implement this trait. Handlers take
/// `Arc<dyn StorageBackend>` so tests can substitute [`MemoryBackend`].
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Reads an entire object.
    ///
    /// Returns [`Error::NotFound`] if the object does not exist.
    async fn get(&self, path: &str) -> Result<Bytes>;

    /// Writes an object with an optional precondition.
    ///
    /// A failed precondition is a normal [`WriteResult`], never an error.
    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult>;

    /// Gets object metadata without reading content.
    ///
    /// Returns `None` if the object does not exist.
    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>>;

    /// Lists objects with the given prefix, in arbitrary order.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;
}

/// In-memory storage backend for testing.
///
/// Thread-safe via `RwLock`. Versions are a per-key counter rendered as a
/// string, mimicking GCS generation numbers.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    version: i64,
    last_modified: DateTime<Utc>,
}

impl MemoryBackend {
    /// Creates a new empty memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        objects
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(format!("object not found: {path}")))
    }

    async fn put(
        &self,
        path: &str,
        data: Bytes,
        precondition: WritePrecondition,
    ) -> Result<WriteResult> {
        let mut objects = self.objects.write().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        let current = objects.get(path);

        if let WritePrecondition::DoesNotExist = precondition {
            if let Some(obj) = current {
                return Ok(WriteResult::PreconditionFailed {
                    current_version: obj.version.to_string(),
                });
            }
        }

        let new_version = current.map_or(1, |o| o.version + 1);
        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                version: new_version,
                last_modified: Utc::now(),
            },
        );
        drop(objects);

        Ok(WriteResult::Success {
            version: new_version.to_string(),
        })
    }

    async fn head(&self, path: &str) -> Result<Option<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(objects.get(path).map(|obj| ObjectMeta {
            path: path.to_string(),
            size: obj.data.len() as u64,
            version: obj.version.to_string(),
            last_modified: Some(obj.last_modified),
        }))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let objects = self.objects.read().map_err(|_| Error::Internal {
            message: "lock poisoned".into(),
        })?;

        Ok(objects
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(path, obj)| ObjectMeta {
                path: path.clone(),
                size: obj.data.len() as u64,
                version: obj.version.to_string(),
                last_modified: Some(obj.last_modified),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrip_preserves_bytes() {
        let backend = MemoryBackend::new();
        let data = Bytes::from_static(b"ATGCATTGGC");

        let result = backend
            .put("input/abc", data.clone(), WritePrecondition::None)
            .await
            .expect("put should succeed");
        assert!(result.is_success());

        let retrieved = backend.get("input/abc").await.expect("get should succeed");
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend.get("input/missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn does_not_exist_precondition_blocks_second_write() {
        let backend = MemoryBackend::new();

        let first = backend
            .put(
                "input/x",
                Bytes::from_static(b"one"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("first put");
        assert!(first.is_success());

        let second = backend
            .put(
                "input/x",
                Bytes::from_static(b"two"),
                WritePrecondition::DoesNotExist,
            )
            .await
            .expect("second put");
        assert!(matches!(second, WriteResult::PreconditionFailed { .. }));

        // The original bytes survive.
        let data = backend.get("input/x").await.expect("get");
        assert_eq!(data, Bytes::from_static(b"one"));
    }

    #[tokio::test]
    async fn unconditional_put_overwrites() {
        let backend = MemoryBackend::new();

        backend
            .put(
                "status/j.json",
                Bytes::from_static(b"v1"),
                WritePrecondition::None,
            )
            .await
            .expect("put v1");
        backend
            .put(
                "status/j.json",
                Bytes::from_static(b"v2"),
                WritePrecondition::None,
            )
            .await
            .expect("put v2");

        let data = backend.get("status/j.json").await.expect("get");
        assert_eq!(data, Bytes::from_static(b"v2"));
    }

    #[tokio::test]
    async fn head_reports_metadata() {
        let backend = MemoryBackend::new();
        backend
            .put(
                "output/y",
                Bytes::from_static(b"data"),
                WritePrecondition::None,
            )
            .await
            .expect("put");

        let meta = backend
            .head("output/y")
            .await
            .expect("head")
            .expect("object exists");
        assert_eq!(meta.size, 4);
        assert_eq!(meta.version, "1");
        assert!(meta.last_modified.is_some());

        assert!(backend.head("output/z").await.expect("head").is_none());
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let backend = MemoryBackend::new();
        for key in ["input/a", "input/b", "output/a"] {
            backend
                .put(key, Bytes::from_static(b"x"), WritePrecondition::None)
                .await
                .expect("put");
        }

        let inputs = backend.list("input/").await.expect("list");
        assert_eq!(inputs.len(), 2);
        let outputs = backend.list("output/").await.expect("list");
        assert_eq!(outputs.len(), 1);
    }
}
