use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Chunk size used by upstream reads unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL used in player pages and links.
    /// Defaults to `http://{host}:{port}`.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Bot identity reported by the status route (without the leading `@`).
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_bot_username() -> String {
    "mediarelay_bot".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            bot_username: default_bot_username(),
        }
    }
}

impl ServerConfig {
    /// Base URL for generated links, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = if self.host == "0.0.0.0" {
                    "localhost"
                } else {
                    self.host.as_str()
                };
                format!("http://{}:{}", host, self.port)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamConfig {
    /// Size of a single upstream read, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamBackend {
    #[default]
    Directory,
    Http,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Number of equivalent upstream clients to balance across.
    #[serde(default = "default_clients")]
    pub clients: usize,

    #[serde(default)]
    pub backend: UpstreamBackend,

    /// Root directory for the directory backend.
    #[serde(default = "default_root")]
    pub root: Option<PathBuf>,

    /// Base URL of the object store for the http backend.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_clients() -> usize {
    1
}
fn default_root() -> Option<PathBuf> {
    Some(PathBuf::from("./media"))
}
fn default_request_timeout() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            clients: default_clients(),
            backend: UpstreamBackend::default(),
            root: default_root(),
            base_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}
