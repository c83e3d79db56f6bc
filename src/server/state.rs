//! Application state for the chat server

use dashmap::DashMap;
use parking_lot::RwLock;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::engine::ChatEngine;
use crate::error::Result;
use crate::providers::OpenAiProvider;
use crate::types::DocumentRecord;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Chat engine owning the vector index
    engine: Arc<ChatEngine>,
    /// Uploaded-document registry (persisted to disk)
    documents: DashMap<Uuid, DocumentRecord>,
    /// Path to the registry file
    documents_path: PathBuf,
    /// Ready state, set after the initial index bootstrap
    ready: RwLock<bool>,
}

impl AppState {
    /// Create new application state. Fails fast when the provider
    /// credential is missing.
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing chat service state...");

        let provider = OpenAiProvider::new(&config.provider)?;
        let (embedder, chat) = provider.split();
        tracing::info!(
            "Provider initialized (chat: {}, embeddings: {})",
            config.provider.chat_model,
            config.provider.embed_model
        );

        let engine = Arc::new(ChatEngine::new(
            &config,
            Arc::new(embedder),
            Arc::new(chat),
        )?);

        let documents_path = config.storage.index_dir.join("documents.json");
        let documents = Self::load_documents(&documents_path);
        tracing::info!("Loaded {} documents from registry", documents.len());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                engine,
                documents,
                documents_path,
                ready: RwLock::new(false),
            }),
        })
    }

    /// Load the document registry from disk
    fn load_documents(path: &PathBuf) -> DashMap<Uuid, DocumentRecord> {
        let documents = DashMap::new();

        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str::<Vec<DocumentRecord>>(&content) {
                    Ok(records) => {
                        for record in records {
                            documents.insert(record.id, record);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse documents.json: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read documents.json: {}", e);
                }
            }
        }

        documents
    }

    /// Persist the document registry to disk
    fn save_documents(&self) {
        let records: Vec<DocumentRecord> = self
            .inner
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        if let Some(parent) = self.inner.documents_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!("Failed to create registry directory: {}", e);
                return;
            }
        }
        match serde_json::to_string_pretty(&records) {
            Ok(content) => {
                if let Err(e) = fs::write(&self.inner.documents_path, content) {
                    tracing::error!("Failed to save documents.json: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize document registry: {}", e);
            }
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the chat engine
    pub fn engine(&self) -> &Arc<ChatEngine> {
        &self.inner.engine
    }

    /// Check if the server finished its initial bootstrap
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Add a record to the registry (persisted)
    pub fn add_document(&self, record: DocumentRecord) {
        self.inner.documents.insert(record.id, record);
        self.save_documents();
    }

    /// Remove a record from the registry (persisted)
    pub fn remove_document(&self, id: &Uuid) -> Option<DocumentRecord> {
        let removed = self.inner.documents.remove(id).map(|(_, record)| record);
        if removed.is_some() {
            self.save_documents();
        }
        removed
    }

    /// All records, newest upload first
    pub fn list_documents(&self) -> Vec<DocumentRecord> {
        let mut records: Vec<DocumentRecord> = self
            .inner
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        records
    }

    /// Stored paths of every registered document, the authoritative file set
    /// for index rebuilds
    pub fn remaining_paths(&self) -> Vec<PathBuf> {
        self.inner
            .documents
            .iter()
            .map(|entry| entry.value().stored_path.clone())
            .collect()
    }
}
