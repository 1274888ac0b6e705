//! Upstream object sources.
//!
//! An [`ObjectSource`] is one connection to the place objects actually live.
//! The streaming core treats it as an opaque capability: resolve an id to
//! metadata, then read whole fixed-size chunks at chunk-aligned offsets.
//!
//! Backends:
//! - [`memory::MemorySource`] - objects held in process
//! - [`directory::DirectorySource`] - objects stored under a local directory
//! - [`http::HttpSource`] - a remote object store reached over HTTP

pub mod directory;
pub mod http;
pub mod memory;

pub use directory::DirectorySource;
pub use http::HttpSource;
pub use memory::MemorySource;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use mediarelay_common::{ObjectId, ObjectMetadata, Result};

use crate::config::{UpstreamBackend, UpstreamConfig};

/// Async trait that all object backends must implement.
///
/// Implementations are shared across request tasks behind an `Arc`.
#[async_trait]
pub trait ObjectSource: Send + Sync {
    /// Short identifier for logging (e.g. `"directory"`).
    fn name(&self) -> &str;

    /// Look up the metadata of an object.
    ///
    /// Returns [`mediarelay_common::Error::NotFound`] when the source has no
    /// such object.
    async fn resolve_metadata(&self, id: ObjectId) -> Result<ObjectMetadata>;

    /// Read the chunk of `chunk_size` bytes starting at `offset`.
    ///
    /// `offset` is always a multiple of `chunk_size`. The returned buffer is
    /// shorter than `chunk_size` only when the chunk is the last one of the
    /// object.
    async fn fetch_chunk(
        &self,
        object: &ObjectMetadata,
        offset: u64,
        chunk_size: u64,
    ) -> Result<Bytes>;
}

/// Build the configured number of equivalent upstream clients.
pub fn build_sources(config: &UpstreamConfig) -> anyhow::Result<Vec<Arc<dyn ObjectSource>>> {
    let mut sources: Vec<Arc<dyn ObjectSource>> = Vec::with_capacity(config.clients);
    for _ in 0..config.clients {
        let source: Arc<dyn ObjectSource> = match config.backend {
            UpstreamBackend::Directory => {
                let root = config
                    .root
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Directory backend requires upstream.root"))?;
                Arc::new(DirectorySource::new(root))
            }
            UpstreamBackend::Http => {
                let base_url = config
                    .base_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("HTTP backend requires upstream.base_url"))?;
                Arc::new(HttpSource::new(base_url, config.request_timeout_secs)?)
            }
        };
        sources.push(source);
    }
    Ok(sources)
}
