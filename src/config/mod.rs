pub mod routes;
pub mod schema;

pub use routes::{default_routes, load_routes, save_routes, RouteEntry};
pub use schema::{EmbeddingBackend, ToolrouterConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Config file name inside the home directory.
pub const CONFIG_FILE: &str = "toolrouter.toml";

/// Default toolrouter home directory (~/.toolrouter).
pub fn default_home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".toolrouter"))
        .unwrap_or_else(|| PathBuf::from(".toolrouter"))
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<ToolrouterConfig> {
    if path.exists() {
        let contents =
            std::fs::read_to_string(path).context("Failed to read toolrouter config file")?;
        let config: ToolrouterConfig =
            toml::from_str(&contents).context("Failed to parse toolrouter config (TOML)")?;
        Ok(config)
    } else {
        Ok(ToolrouterConfig::default())
    }
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &ToolrouterConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_home_is_dot_toolrouter() {
        assert!(default_home_dir().ends_with(".toolrouter"));
    }

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, ToolrouterConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = ToolrouterConfig {
            embedding_backend: EmbeddingBackend::Http,
            completion_model: "mixtral".into(),
            ..Default::default()
        };
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "embedding_backend = \"http\"\nmax_tokens = 64\n").unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.embedding_backend, EmbeddingBackend::Http);
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.hashing_dimensions, 256);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "max_tokens = \"lots\"").unwrap();
        assert!(load_config(&path).is_err());
    }
}
