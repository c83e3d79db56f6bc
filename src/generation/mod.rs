//! Prompt construction for the response strategies

mod prompt;

pub use prompt::{PromptBuilder, NO_CONTEXT_FALLBACK};
