//! Chat wire types and the engine's chat result

use serde::{Deserialize, Serialize};

use crate::routing::Route;

/// Who produced a history entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The human user
    User,
    /// The assistant
    Assistant,
}

impl Speaker {
    /// Display label used when rendering history into prompts
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// One entry of caller-supplied conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Speaker role
    pub role: Speaker,
    /// Message content
    pub content: String,
}

impl ChatTurn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            content: content.into(),
        }
    }
}

/// POST /api/chat request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// User message
    pub message: String,
    /// Explicit mode ("rag" or "direct"); absent lets the router decide
    #[serde(default)]
    pub mode: Option<String>,
    /// Prior conversation turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// POST /api/chat response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated answer
    pub response: String,
    /// Route label that produced the answer
    pub intent: String,
    /// Source paths of the chunks used for grounding
    pub used_documents: Vec<String>,
}

impl ChatResponse {
    /// Build the wire response from an engine outcome
    pub fn from_outcome(outcome: ChatOutcome) -> Self {
        Self {
            response: outcome.answer,
            intent: outcome.route.label().to_string(),
            used_documents: outcome.sources,
        }
    }
}

/// Result of one chat call
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Answer text
    pub answer: String,
    /// Route that produced the answer
    pub route: Route,
    /// De-duplicated source paths of the retrieved chunks, in rank order
    pub sources: Vec<String>,
}
