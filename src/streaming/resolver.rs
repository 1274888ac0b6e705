//! Object metadata resolution and token checks.
//!
//! Metadata lookups are an upstream round trip, so successful resolutions are
//! memoized per (client, object) for the lifetime of the process. Objects
//! never change once stored, which means entries are never invalidated and a
//! race that resolves the same object twice simply stores an equal value.

use std::sync::Arc;

use dashmap::DashMap;
use mediarelay_common::{ClientId, Error, ObjectId, ObjectMetadata, Result};

use crate::source::ObjectSource;

/// Append-only cache of resolved metadata.
#[derive(Default)]
pub struct MetadataCache {
    entries: DashMap<(ClientId, ObjectId), Arc<ObjectMetadata>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, client: ClientId, id: ObjectId) -> Option<Arc<ObjectMetadata>> {
        self.entries.get(&(client, id)).map(|e| Arc::clone(e.value()))
    }

    pub fn insert(&self, client: ClientId, metadata: Arc<ObjectMetadata>) {
        self.entries.insert((client, metadata.object_id), metadata);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves object ids to metadata through a shared [`MetadataCache`].
pub struct ObjectResolver {
    cache: Arc<MetadataCache>,
}

impl ObjectResolver {
    pub fn new(cache: Arc<MetadataCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Resolve `id` through `source`, reusing a previous resolution made on
    /// the same client.
    pub async fn resolve(
        &self,
        client: ClientId,
        source: &dyn ObjectSource,
        id: ObjectId,
    ) -> Result<Arc<ObjectMetadata>> {
        if let Some(hit) = self.cache.get(client, id) {
            tracing::trace!(client = %client, object_id = %id, "Metadata cache hit");
            return Ok(hit);
        }

        let metadata = Arc::new(source.resolve_metadata(id).await?);
        if metadata.object_id != id {
            return Err(Error::internal(format!(
                "source {} answered object {} for {}",
                source.name(),
                metadata.object_id,
                id
            )));
        }
        tracing::debug!(
            client = %client,
            object_id = %id,
            size = metadata.size_bytes,
            "Resolved object metadata"
        );
        self.cache.insert(client, Arc::clone(&metadata));
        Ok(metadata)
    }

    /// Fail with [`Error::InvalidAuthorization`] unless `supplied` matches.
    ///
    /// This is a coarse capability check, not a security boundary.
    pub fn authorize(metadata: &ObjectMetadata, supplied: Option<&str>) -> Result<()> {
        match supplied {
            Some(token) if verify_token(metadata, token) => Ok(()),
            _ => Err(Error::InvalidAuthorization),
        }
    }
}

/// True iff `supplied` equals the first [`mediarelay_common::TOKEN_LEN`] characters of the
/// object's unique token. Comparison is case-sensitive.
pub fn verify_token(metadata: &ObjectMetadata, supplied: &str) -> bool {
    metadata.short_token() == supplied
}
