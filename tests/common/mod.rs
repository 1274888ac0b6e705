//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds an [`AppContext`] over in-memory
//! upstream clients. The [`TestHarness::with_server`] constructor starts Axum
//! on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use mediarelay::config::Config;
use mediarelay::server::{create_router, AppContext};
use mediarelay::source::{MemorySource, ObjectSource};

pub const MIB: usize = 1024 * 1024;

/// Token every fixture object is stored under; requests use its first six
/// characters.
pub const TOKEN: &str = "AgADBQAD1234";
pub const SHORT: &str = "AgADBQ";

/// Deterministic, non-repeating-per-chunk content.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub struct TestHarness {
    pub ctx: AppContext,
    /// The same objects are registered on every client.
    pub sources: Vec<Arc<MemorySource>>,
}

impl TestHarness {
    /// One client, 1 MiB chunks.
    pub fn new() -> Self {
        Self::with_clients(1)
    }

    pub fn with_clients(clients: usize) -> Self {
        Self::with_config(clients, Config::default())
    }

    pub fn with_config(clients: usize, config: Config) -> Self {
        let sources: Vec<Arc<MemorySource>> =
            (0..clients).map(|_| Arc::new(MemorySource::new())).collect();
        let dyn_sources: Vec<Arc<dyn ObjectSource>> = sources
            .iter()
            .map(|s| Arc::clone(s) as Arc<dyn ObjectSource>)
            .collect();
        let ctx = AppContext::new(config, dyn_sources).expect("failed to build context");
        Self { ctx, sources }
    }

    /// Register an object on every client.
    pub fn insert(&self, id: u64, file_name: Option<&str>, mime: Option<&str>, data: Vec<u8>) {
        for source in &self.sources {
            source.insert(id, TOKEN, file_name, mime, data.clone());
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    pub fn loads(&self) -> Vec<usize> {
        self.ctx.pool.loads().snapshot()
    }

    /// Send a GET with an optional `Range` header through the router.
    pub async fn get(&self, uri: &str, range: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(range) = range {
            builder = builder.header("range", range);
        }
        self.router()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// Start an Axum server on a random port.
    pub async fn with_server(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
