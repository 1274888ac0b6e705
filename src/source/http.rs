//! Object source backed by a remote object store.
//!
//! The store exposes two endpoints per object:
//!
//! - `GET {base}/objects/{id}` - JSON metadata
//! - `GET {base}/objects/{id}/content` - object bytes, honouring `Range`

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mediarelay_common::{Error, ObjectId, ObjectMetadata, Result};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use super::ObjectSource;

/// Metadata document returned by the object store.
#[derive(Debug, Deserialize)]
struct RemoteObject {
    size: u64,
    unique_token: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

/// Object source speaking to a remote store over HTTP.
///
/// Each instance owns its own `reqwest::Client` and therefore its own
/// connection pool.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, id: ObjectId) -> String {
        format!("{}/objects/{}", self.base_url, id)
    }
}

#[async_trait]
impl ObjectSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn resolve_metadata(&self, id: ObjectId) -> Result<ObjectMetadata> {
        let response = self
            .client
            .get(self.object_url(id))
            .send()
            .await
            .map_err(|e| Error::upstream(format!("metadata request for {id}: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::not_found(id));
        }
        if !response.status().is_success() {
            return Err(Error::upstream(format!(
                "metadata request for {id} returned {}",
                response.status()
            )));
        }

        let remote: RemoteObject = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("invalid metadata for {id}: {e}")))?;

        Ok(ObjectMetadata {
            object_id: id,
            unique_token: remote.unique_token,
            size_bytes: remote.size,
            mime_type: remote.mime_type,
            file_name: remote.file_name,
        })
    }

    async fn fetch_chunk(
        &self,
        object: &ObjectMetadata,
        offset: u64,
        chunk_size: u64,
    ) -> Result<Bytes> {
        let id = object.object_id;
        let last = offset.saturating_add(chunk_size).saturating_sub(1);
        let response = self
            .client
            .get(format!("{}/content", self.object_url(id)))
            .header(header::RANGE, format!("bytes={offset}-{last}"))
            .send()
            .await
            .map_err(|e| Error::upstream(format!("chunk request for {id}@{offset}: {e}")))?;

        match response.status() {
            StatusCode::PARTIAL_CONTENT => {}
            // A store that ignores Range only works for the first chunk.
            StatusCode::OK if offset == 0 => {}
            status => {
                return Err(Error::upstream(format!(
                    "chunk request for {id}@{offset} returned {status}"
                )));
            }
        }

        let mut body = response
            .bytes()
            .await
            .map_err(|e| Error::upstream(format!("reading chunk {id}@{offset}: {e}")))?;
        if body.len() as u64 > chunk_size {
            body.truncate(chunk_size as usize);
        }
        Ok(body)
    }
}
