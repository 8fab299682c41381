pub use vc_core::config::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default config locations, checked in order.
pub const DEFAULT_PATHS: [&str; 3] = [
    "./vidcue.toml",
    "~/.config/vidcue/config.toml",
    "/etc/vidcue/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for warning in config.validate() {
        tracing::warn!("{}: {}", path.display(), warning);
    }

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {}", path.display());
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Apply command-line overrides on top of the loaded config.
pub fn apply_overrides(config: &mut Config, server: Option<&str>) {
    if let Some(server) = server {
        config.api.base_url = server.trim_end_matches('/').to_string();
    }
}
