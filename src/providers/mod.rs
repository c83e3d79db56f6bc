//! Provider abstractions for embeddings and chat completion
//!
//! Trait-based seams so the engine never depends on a concrete backend;
//! the OpenAI-compatible client is the production implementation and tests
//! substitute deterministic mocks.

pub mod embedding;
pub mod llm;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use openai::{OpenAiChat, OpenAiClient, OpenAiEmbedder, OpenAiProvider};
