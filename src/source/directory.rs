//! Object source backed by a local directory.
//!
//! Object `N` is the single regular file stored inside `<root>/N/`; the file
//! keeps its original name, which becomes the object's file name.
//!
//! ```text
//! media/
//!   1042/
//!     Big.Buck.Bunny.mkv
//!   1043/
//!     trailer.mp4
//! ```

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use dashmap::DashMap;
use mediarelay_common::{Error, ObjectId, ObjectMetadata, Result};
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::ObjectSource;

/// Bytes of the digest kept in a unique token (16 base64 characters).
const TOKEN_DIGEST_BYTES: usize = 12;

/// Derive the unique token of a stored file from its identity.
pub fn derive_token(id: ObjectId, file_name: &str, size: u64) -> String {
    let digest = Sha256::digest(format!("{id}:{file_name}:{size}").as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..TOKEN_DIGEST_BYTES])
}

/// Object source reading files from `<root>/<id>/`.
pub struct DirectorySource {
    root: PathBuf,
    paths: DashMap<ObjectId, PathBuf>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            paths: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the file stored for `id`, preferring the lowest name if the
    /// directory somehow holds several.
    async fn locate(&self, id: ObjectId) -> Result<PathBuf> {
        if let Some(path) = self.paths.get(&id) {
            return Ok(path.clone());
        }

        let dir = self.root.join(id.to_string());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found(id));
            }
            Err(e) => return Err(Error::upstream(format!("reading {}: {e}", dir.display()))),
        };

        let mut best: Option<PathBuf> = None;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::upstream(format!("reading {}: {e}", dir.display())))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            let path = entry.path();
            if best.as_ref().map_or(true, |b| path < *b) {
                best = Some(path);
            }
        }

        let path = best.ok_or_else(|| Error::not_found(id))?;
        self.paths.insert(id, path.clone());
        Ok(path)
    }
}

#[async_trait]
impl ObjectSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn resolve_metadata(&self, id: ObjectId) -> Result<ObjectMetadata> {
        let path = self.locate(id).await?;
        let size = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::upstream(format!("stat {}: {e}", path.display())))?
            .len();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let mime_type = mime_guess::from_path(&path)
            .first()
            .map(|m| m.essence_str().to_string());
        let unique_token = derive_token(id, file_name.as_deref().unwrap_or_default(), size);

        tracing::debug!(object_id = %id, path = %path.display(), size, "Resolved directory object");

        Ok(ObjectMetadata {
            object_id: id,
            unique_token,
            size_bytes: size,
            mime_type,
            file_name,
        })
    }

    async fn fetch_chunk(
        &self,
        object: &ObjectMetadata,
        offset: u64,
        chunk_size: u64,
    ) -> Result<Bytes> {
        let path = self.locate(object.object_id).await?;
        let io_err = |e: std::io::Error| Error::upstream(format!("{}: {e}", path.display()));

        let mut file = File::open(&path).await.map_err(io_err)?;
        file.seek(SeekFrom::Start(offset)).await.map_err(io_err)?;

        let mut buf = Vec::with_capacity(chunk_size.min(object.size_bytes) as usize);
        file.take(chunk_size)
            .read_to_end(&mut buf)
            .await
            .map_err(io_err)?;

        if buf.is_empty() && chunk_size > 0 {
            return Err(Error::upstream(format!(
                "offset {offset} beyond end of {}",
                path.display()
            )));
        }
        Ok(Bytes::from(buf))
    }
}
