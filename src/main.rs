mod cli;

use mediarelay::{config, render::ObjectLinks, server, source};
use mediarelay_common::ObjectId;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // CLI flags win over the config file
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting Mediarelay server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let clients = source::build_sources(&config.upstream)?;
    tracing::info!(
        "Initialized {} upstream client(s) using {} backend",
        clients.len(),
        clients.first().map(|c| c.name()).unwrap_or("unknown")
    );

    server::start_server(config, clients).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediarelay=trace,mediarelay_common=debug,tower_http=debug".to_string()
        } else {
            "mediarelay=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Link { id } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(print_links(ObjectId::new(id), cli.config.as_deref()))
        }
        Commands::Version => {
            println!("mediarelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Public URL: {}", config.server.base_url());
            println!("  Chunk size: {} bytes", config.stream.chunk_size);
            println!("  Upstream backend: {:?}", config.upstream.backend);
            println!("  Upstream clients: {}", config.upstream.clients);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Chunk size: {} bytes", config.stream.chunk_size);
        }
    }

    Ok(())
}

async fn print_links(id: ObjectId, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let clients = source::build_sources(&config.upstream)?;
    let client = clients.first().context("No upstream client configured")?;

    let object = client
        .resolve_metadata(id)
        .await
        .with_context(|| format!("Failed to resolve object {}", id))?;
    tracing::debug!(object_id = %id, source = client.name(), "Resolved object");

    let links = ObjectLinks::new(&config.server.base_url(), &object);
    println!("File: {} ({} bytes)", links.file_name, object.size_bytes);
    println!("Watch:    {}", links.watch);
    println!("Embed:    {}", links.embed);
    println!("Stream:   {}", links.stream);
    println!("Download: {}", links.download);
    println!("Compact:  {}", links.compact);
    Ok(())
}
