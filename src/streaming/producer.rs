//! Ordered chunk production for one stream session.
//!
//! A [`ChunkProducer`] binds one upstream client, one object and one
//! [`RangePlan`]. It fetches the planned chunks strictly in order, trims the
//! first and last, and yields buffers whose concatenation is exactly the
//! requested byte range. It is forward-only: once exhausted, failed or
//! dropped, a new producer has to be built to stream again.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{self, Stream};
use mediarelay_common::{Error, ObjectMetadata, Result};

use super::load::LoadGuard;
use super::range::RangePlan;
use crate::source::ObjectSource;

pub struct ChunkProducer {
    source: Arc<dyn ObjectSource>,
    object: Arc<ObjectMetadata>,
    plan: RangePlan,
    next_index: u64,
    finished: bool,
    /// Keeps the serving client's load counter raised until the session ends.
    load: Option<LoadGuard>,
}

impl ChunkProducer {
    pub fn new(
        source: Arc<dyn ObjectSource>,
        object: Arc<ObjectMetadata>,
        plan: RangePlan,
    ) -> Self {
        Self {
            source,
            object,
            plan,
            next_index: 0,
            finished: plan.chunk_count == 0,
            load: None,
        }
    }

    /// Tie a load guard to the lifetime of this session.
    pub fn with_load_guard(mut self, guard: LoadGuard) -> Self {
        self.load = Some(guard);
        self
    }

    pub fn plan(&self) -> &RangePlan {
        &self.plan
    }

    /// Fetch, trim and return the next chunk, or `None` once the plan is
    /// exhausted. After an error the producer yields nothing more.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes>> {
        if self.finished {
            return None;
        }

        let index = self.next_index;
        let offset = self.plan.chunk_offset(index);
        let fetched = self
            .source
            .fetch_chunk(&self.object, offset, self.plan.chunk_size)
            .await
            .and_then(|chunk| self.trim(index, chunk));

        match fetched {
            Ok(chunk) => {
                self.next_index += 1;
                if self.next_index == self.plan.chunk_count {
                    self.finished = true;
                    tracing::debug!(
                        object_id = %self.object.object_id,
                        start = self.plan.start_byte,
                        end = self.plan.end_byte_inclusive,
                        chunks = self.plan.chunk_count,
                        "Stream completed"
                    );
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                tracing::error!(
                    object_id = %self.object.object_id,
                    chunk = index,
                    offset,
                    error = %e,
                    "Error streaming object"
                );
                Some(Err(e))
            }
        }
    }

    fn trim(&self, index: u64, chunk: Bytes) -> Result<Bytes> {
        let (start, end) = self.plan.keep_range(index);
        if (chunk.len() as u64) < end {
            return Err(Error::upstream(format!(
                "short chunk at offset {}: got {} bytes, needed {}",
                self.plan.chunk_offset(index),
                chunk.len(),
                end
            )));
        }
        Ok(chunk.slice(start as usize..end as usize))
    }

    /// Turn the producer into a stream suitable for an HTTP response body.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        stream::unfold(self, |mut producer| async move {
            producer.next_chunk().await.map(|item| (item, producer))
        })
    }
}

impl Drop for ChunkProducer {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                object_id = %self.object.object_id,
                delivered_chunks = self.next_index,
                planned_chunks = self.plan.chunk_count,
                "Stream abandoned before completion"
            );
        }
    }
}
