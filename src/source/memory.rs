//! In-process object source.
//!
//! Holds object bytes in memory and counts metadata round trips, which makes
//! it the backend of choice for tests and benchmarks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use mediarelay_common::{Error, ObjectId, ObjectMetadata, Result};
use parking_lot::RwLock;

use super::ObjectSource;

struct StoredObject {
    metadata: ObjectMetadata,
    data: Bytes,
}

/// Object source backed by an in-memory map.
#[derive(Default)]
pub struct MemorySource {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
    metadata_lookups: AtomicUsize,
    chunk_fetches: AtomicUsize,
    /// Chunk index (0-based, object-wide) at which fetches start failing.
    fail_from_chunk: RwLock<Option<u64>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object and return the metadata the source will report for it.
    pub fn insert(
        &self,
        id: u64,
        unique_token: &str,
        file_name: Option<&str>,
        mime_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> ObjectMetadata {
        let data = data.into();
        let metadata = ObjectMetadata {
            object_id: ObjectId::new(id),
            unique_token: unique_token.to_string(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.map(str::to_string),
            file_name: file_name.map(str::to_string),
        };
        self.objects.write().insert(
            metadata.object_id,
            StoredObject {
                metadata: metadata.clone(),
                data,
            },
        );
        metadata
    }

    /// Make every fetch of chunk `index` or later fail with an upstream error.
    pub fn fail_from_chunk(&self, index: u64) {
        *self.fail_from_chunk.write() = Some(index);
    }

    /// Number of `resolve_metadata` calls served so far.
    pub fn metadata_lookups(&self) -> usize {
        self.metadata_lookups.load(Ordering::SeqCst)
    }

    /// Number of `fetch_chunk` calls served so far.
    pub fn chunk_fetches(&self) -> usize {
        self.chunk_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn resolve_metadata(&self, id: ObjectId) -> Result<ObjectMetadata> {
        self.metadata_lookups.fetch_add(1, Ordering::SeqCst);
        self.objects
            .read()
            .get(&id)
            .map(|o| o.metadata.clone())
            .ok_or_else(|| Error::not_found(id))
    }

    async fn fetch_chunk(
        &self,
        object: &ObjectMetadata,
        offset: u64,
        chunk_size: u64,
    ) -> Result<Bytes> {
        self.chunk_fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(fail_from) = *self.fail_from_chunk.read() {
            if chunk_size > 0 && offset / chunk_size >= fail_from {
                return Err(Error::upstream(format!(
                    "injected failure at offset {offset}"
                )));
            }
        }

        let objects = self.objects.read();
        let stored = objects
            .get(&object.object_id)
            .ok_or_else(|| Error::not_found(object.object_id))?;

        let len = stored.data.len() as u64;
        if offset >= len {
            return Err(Error::upstream(format!(
                "offset {offset} beyond end of object ({len} bytes)"
            )));
        }
        let end = offset.saturating_add(chunk_size).min(len);
        Ok(stored.data.slice(offset as usize..end as usize))
    }
}
