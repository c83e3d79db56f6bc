//! Immutable flat vector index with exact cosine search
//!
//! The index never mutates in place: additions produce a new index value,
//! and persistence writes through a temp file so a crash mid-save leaves
//! the previous on-disk index intact.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Chunk;

const INDEX_FILE: &str = "index.json";

/// One embedded chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    embedding: Vec<f32>,
    chunk: Chunk,
}

/// A chunk with its similarity to the query
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Flat exact-similarity index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build an index from parallel embeddings and chunks. An index is never
    /// empty; callers skip the build when there is nothing to store.
    pub fn build(embeddings: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::index("cannot build an index from no chunks"));
        }
        if embeddings.len() != chunks.len() {
            return Err(Error::index(format!(
                "embedding count ({}) does not match chunk count ({})",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings[0].len();
        let mut entries = Vec::with_capacity(chunks.len());
        for (embedding, chunk) in embeddings.into_iter().zip(chunks) {
            if embedding.len() != dimensions {
                return Err(Error::index(format!(
                    "inconsistent embedding dimensions: expected {}, got {}",
                    dimensions,
                    embedding.len()
                )));
            }
            entries.push(IndexEntry { embedding, chunk });
        }

        Ok(Self {
            dimensions,
            entries,
        })
    }

    /// A new index containing this one's entries plus the given additions
    pub fn with_added(&self, embeddings: Vec<Vec<f32>>, chunks: Vec<Chunk>) -> Result<Self> {
        if embeddings.len() != chunks.len() {
            return Err(Error::index(format!(
                "embedding count ({}) does not match chunk count ({})",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut entries = self.entries.clone();
        entries.reserve(chunks.len());
        for (embedding, chunk) in embeddings.into_iter().zip(chunks) {
            if embedding.len() != self.dimensions {
                return Err(Error::index(format!(
                    "embedding dimension mismatch: index has {}, addition has {}",
                    self.dimensions,
                    embedding.len()
                )));
            }
            entries.push(IndexEntry { embedding, chunk });
        }

        Ok(Self {
            dimensions: self.dimensions,
            entries,
        })
    }

    /// Top-k chunks by cosine similarity, best first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimensions {
            return Err(Error::index(format!(
                "query dimension mismatch: index has {}, query has {}",
                self.dimensions,
                query.len()
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Persist to `dir/index.json` via a temp file in the same directory,
    /// so the rename is atomic and a reader never sees a partial write.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut file, self)?;
        file.persist(dir.join(INDEX_FILE))
            .map_err(|e| Error::index(format!("failed to persist index file: {}", e)))?;
        Ok(())
    }

    /// Remove the persisted index file, if present
    pub fn remove_saved(dir: &Path) -> Result<()> {
        let path = dir.join(INDEX_FILE);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Load a persisted index. A missing file means no index has been built
    /// yet; a present but unreadable file is an error.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(INDEX_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path)?;
        let index: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::index(format!("corrupt index at {}: {}", path.display(), e)))?;
        Ok(Some(index))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
