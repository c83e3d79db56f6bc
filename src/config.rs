//! Configuration for the chat service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding/LLM provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Routing configuration
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,
}

impl RagConfig {
    /// Resolve configuration from the environment.
    ///
    /// `OPENAI_API_KEY` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config("OPENAI_API_KEY must be set".to_string()))?;

        let mut config = Self::default();
        config.provider.api_key = api_key;

        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.provider.base_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_CHAT_MODEL") {
            config.provider.chat_model = model;
        }
        if let Ok(model) = std::env::var("OPENAI_EMBED_MODEL") {
            config.provider.embed_model = model;
        }
        if let Ok(dir) = std::env::var("RAGCHAT_DOCS_DIR") {
            config.storage.docs_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("RAGCHAT_INDEX_DIR") {
            config.storage.index_dir = PathBuf::from(dir);
        }
        if let Ok(host) = std::env::var("RAGCHAT_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("RAGCHAT_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid RAGCHAT_PORT: {}", port)))?;
        }
        if let Ok(mb) = std::env::var("RAGCHAT_MAX_UPLOAD_MB") {
            let mb: usize = mb
                .parse()
                .map_err(|_| Error::Config(format!("Invalid RAGCHAT_MAX_UPLOAD_MB: {}", mb)))?;
            config.server.max_upload_size = mb * 1024 * 1024;
        }
        if let Ok(strategy) = std::env::var("RAGCHAT_ROUTER") {
            config.routing.strategy = match strategy.to_lowercase().as_str() {
                "explicit" => RouterStrategy::Explicit,
                "inferred" => RouterStrategy::Inferred,
                other => {
                    return Err(Error::Config(format!(
                        "Invalid RAGCHAT_ROUTER '{}': expected 'explicit' or 'inferred'",
                        other
                    )))
                }
            };
        }
        if let Ok(reference) = std::env::var("RAGCHAT_PLAYBOOK_REFERENCE") {
            config.routing.playbook_reference = reference;
        }

        Ok(config)
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Maximum upload size in bytes (default: 25MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_size: 25 * 1024 * 1024, // 25MB
        }
    }
}

/// Embedding/LLM provider configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (from OPENAI_API_KEY)
    #[serde(default)]
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Chat completion model
    pub chat_model: String,
    /// Embedding model
    pub embed_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            embed_model: "text-embedding-ada-002".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks to retrieve per query
    pub top_k: usize,
    /// Minimum concatenated context length for grounding
    pub min_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_context_chars: 100,
        }
    }
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Router strategy (explicit caller-supplied mode or LLM-inferred intent)
    #[serde(default)]
    pub strategy: RouterStrategy,
    /// Reference document named in the playbook-authoring prompt
    #[serde(default = "default_playbook_reference")]
    pub playbook_reference: String,
}

fn default_playbook_reference() -> String {
    "the playbook authoring guide".to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: RouterStrategy::default(),
            playbook_reference: default_playbook_reference(),
        }
    }
}

/// Router strategy selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouterStrategy {
    /// Caller supplies the mode; absent mode defaults to rag
    #[default]
    Explicit,
    /// LLM classifies the message when no mode is given
    Inferred,
}

/// Storage paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory scanned for ingestable documents
    pub docs_dir: PathBuf,
    /// Directory holding the persisted vector index
    pub index_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            index_dir: PathBuf::from("index"),
        }
    }
}
