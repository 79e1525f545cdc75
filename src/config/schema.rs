//! Configuration schema for toolrouter.toml.

use serde::{Deserialize, Serialize};

/// Environment variable that overrides `api_key`.
pub const API_KEY_ENV: &str = "TOOLROUTER_API_KEY";

/// Which embedder backs the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible embedding service.
    Http,
    /// Offline feature hashing.
    Hashing,
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolrouterConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_base_url: String,

    /// API key for the embedding and completion services.
    pub api_key: String,

    /// Embedding backend for routing.
    pub embedding_backend: EmbeddingBackend,

    /// Embedding model (http backend).
    pub embedding_model: String,

    /// Vector size (hashing backend).
    pub hashing_dimensions: usize,

    /// Chat model for completions.
    pub completion_model: String,

    /// Maximum tokens per completion.
    pub max_tokens: u32,

    /// System prompt for `ask`.
    pub system_prompt: String,

    /// Path to the routes YAML file.
    pub routes_path: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

impl Default for ToolrouterConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com".into(),
            api_key: String::new(),
            embedding_backend: EmbeddingBackend::Hashing,
            embedding_model: "text-embedding-ada-002".into(),
            hashing_dimensions: 256,
            completion_model: "gpt-4o-mini".into(),
            max_tokens: 1024,
            system_prompt: "You are a helpful assistant. Use a tool when one fits the request."
                .into(),
            routes_path: "~/.toolrouter/routes.yml".into(),
            log_level: "info".into(),
        }
    }
}

impl ToolrouterConfig {
    /// Resolve a path that may contain `~` to an absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        shellexpand::tilde(path).into_owned()
    }

    /// Resolved routes file path.
    pub fn resolved_routes_path(&self) -> String {
        self.resolve_path(&self.routes_path)
    }

    /// Log filter directive: the command-line value when given, else the
    /// file's, else `info`.
    pub fn effective_log_level<'a>(&'a self, cli: Option<&'a str>) -> &'a str {
        cli.or(Some(self.log_level.as_str()))
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("info")
    }

    /// API key, preferring the environment over the file.
    pub fn effective_api_key(&self) -> String {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| self.api_key.clone())
    }
}
