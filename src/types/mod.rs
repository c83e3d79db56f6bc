//! Core types for documents, chunks, and the chat wire format

pub mod chat;
pub mod document;
pub mod record;

pub use chat::{ChatOutcome, ChatRequest, ChatResponse, ChatTurn, Speaker};
pub use document::{Chunk, ChunkMetadata, Document, SourceFormat};
pub use record::{DocumentListResponse, DocumentRecord, IngestSummary, UploadResponse};
