//! Vector retrieval over embedded chunks

mod index;

pub use index::{ScoredChunk, VectorIndex};
