mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./mediarelay.toml",
        "~/.config/mediarelay/config.toml",
        "/etc/mediarelay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.stream.chunk_size == 0 {
        anyhow::bail!("Stream chunk_size must be greater than 0");
    }

    if config.upstream.clients == 0 {
        anyhow::bail!("At least one upstream client is required");
    }

    match config.upstream.backend {
        UpstreamBackend::Directory => match &config.upstream.root {
            Some(root) if !root.exists() => {
                tracing::warn!("Upstream root does not exist: {:?}", root);
            }
            Some(_) => {}
            None => anyhow::bail!("Directory backend requires upstream.root"),
        },
        UpstreamBackend::Http => {
            if config.upstream.base_url.as_deref().map_or(true, str::is_empty) {
                anyhow::bail!("HTTP backend requires upstream.base_url");
            }
        }
    }

    Ok(())
}
