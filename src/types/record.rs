//! Uploaded-document registry records and document API responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// One uploaded document tracked by the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Record ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub original_name: String,
    /// Path where the file was stored
    pub stored_path: PathBuf,
    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a record for a freshly stored upload
    pub fn new(original_name: impl Into<String>, stored_path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_name: original_name.into(),
            stored_path: stored_path.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// GET /api/documents response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    /// Records, newest first
    pub documents: Vec<DocumentRecord>,
    /// Total record count
    pub total: usize,
}

/// POST /api/documents response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// The stored record
    pub document: DocumentRecord,
    /// Sources ingested from the uploaded file
    pub ingested_sources: Vec<String>,
}

/// POST /api/documents/ingest response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Distinct sources ingested, sorted
    pub ingested_sources: Vec<String>,
    /// Number of distinct sources
    pub count: usize,
}

impl IngestSummary {
    /// Summarize an ingest result
    pub fn new(ingested_sources: Vec<String>) -> Self {
        let count = ingested_sources.len();
        Self {
            ingested_sources,
            count,
        }
    }
}
