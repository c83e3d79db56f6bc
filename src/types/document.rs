//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported source formats, keyed by file extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// PDF document
    Pdf,
    /// Plain text file
    Text,
    /// Microsoft Word document (.docx)
    Docx,
    /// Markdown file
    Markdown,
    /// HTML document
    Html,
    /// XML document
    Xml,
    /// JSON document (ingested as one text blob)
    Json,
    /// CSV file (one document per row)
    Csv,
}

impl SourceFormat {
    /// Detect format from a file extension. Unrecognized extensions map to `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            "docx" => Some(Self::Docx),
            "md" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "xml" => Some(Self::Xml),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Provenance metadata carried on every document and chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Source file path
    pub source: String,
    /// Page number, when the loader extracted page by page (1-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Row number for CSV rows (0-indexed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
}

impl ChunkMetadata {
    /// Metadata with only a source path
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page: None,
            row: None,
        }
    }

    /// Metadata for a page-scoped document
    pub fn page(source: impl Into<String>, page: u32) -> Self {
        Self {
            source: source.into(),
            page: Some(page),
            row: None,
        }
    }

    /// Metadata for a CSV row document
    pub fn row(source: impl Into<String>, row: u32) -> Self {
        Self {
            source: source.into(),
            page: None,
            row: Some(row),
        }
    }
}

/// A loaded document before splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text content
    pub text: String,
    /// Provenance metadata
    pub metadata: ChunkMetadata,
}

impl Document {
    /// Create a new document
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A bounded text window, the unit of embedding and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Window text
    pub text: String,
    /// Provenance metadata inherited from the source document
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}
