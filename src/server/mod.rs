use crate::config::Config;
use crate::render::PlayerRenderer;
use crate::source::ObjectSource;
use crate::streaming::{MetadataCache, ObjectResolver, UpstreamPool};
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod routes_player;
pub mod routes_status;
pub mod routes_stream;

pub use error::AppError;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Upstream clients and their load counters
    pub pool: Arc<UpstreamPool>,
    /// Metadata resolution with the process-wide cache
    pub resolver: Arc<ObjectResolver>,
    pub renderer: Arc<PlayerRenderer>,
    pub started_at: Instant,
}

impl AppContext {
    /// Build the context around already constructed upstream clients.
    pub fn new(config: Config, clients: Vec<Arc<dyn ObjectSource>>) -> Result<Self> {
        let pool = Arc::new(UpstreamPool::new(clients)?);
        let resolver = Arc::new(ObjectResolver::new(Arc::new(MetadataCache::new())));
        let renderer = Arc::new(PlayerRenderer::new(
            Arc::clone(&pool),
            Arc::clone(&resolver),
            config.server.base_url(),
        ));

        Ok(Self {
            config: Arc::new(config),
            pool,
            resolver,
            renderer,
            started_at: Instant::now(),
        })
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Status
        .route("/", get(routes_status::status))
        // Player pages
        .route("/watch/*path", get(routes_player::watch))
        .route("/embed/*path", get(routes_player::embed))
        // Streaming
        .route("/file/*path", get(routes_stream::file_stream))
        // Compact `/{token}{id}` and `/{id}/...` forms
        .fallback(routes_stream::path_stream)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Start the HTTP server
pub async fn start_server(config: Config, clients: Vec<Arc<dyn ObjectSource>>) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::new(config, clients)?;
    tracing::info!(
        clients = ctx.pool.len(),
        chunk_size = ctx.config.stream.chunk_size,
        "Upstream pool ready"
    );

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
