//! ragchat: a RAG chat service with document ingestion and grounded answers
//!
//! Ingests heterogeneous documents (PDF, DOCX, Markdown, HTML, XML, JSON,
//! CSV, plain text), indexes them for semantic search, and answers chat
//! messages either grounded in retrieved excerpts or directly via the
//! language model. Built around an OpenAI-compatible provider API.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod routing;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use engine::ChatEngine;
pub use error::{Error, Result};
pub use types::{
    chat::{ChatOutcome, ChatRequest, ChatResponse, ChatTurn},
    document::{Chunk, ChunkMetadata, Document, SourceFormat},
    record::DocumentRecord,
};
