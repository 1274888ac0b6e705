//! Object metadata shared between sources, the resolver and the server.

use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;

/// Number of leading characters of a unique token that a URL must carry.
pub const TOKEN_LEN: usize = 6;

/// Immutable description of a stored object, as reported by its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub object_id: ObjectId,
    /// Short opaque token derived from the object's identity.
    pub unique_token: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl ObjectMetadata {
    /// The token prefix that links to this object must carry.
    pub fn short_token(&self) -> &str {
        // Tokens are ASCII in every backend, but never split a code point.
        match self.unique_token.char_indices().nth(TOKEN_LEN) {
            Some((idx, _)) => &self.unique_token[..idx],
            None => &self.unique_token,
        }
    }
}
