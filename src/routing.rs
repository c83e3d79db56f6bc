//! Intent and mode routing
//!
//! Routing is pure: given an explicit mode and/or a classifier label, the
//! chosen route is always the same. The LLM classification call itself lives
//! in the engine; this module only parses its output and decides.

use crate::error::{Error, Result};

/// Explicit chat mode supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    /// Retrieve context and ground the answer
    Rag,
    /// Skip retrieval entirely
    Direct,
}

impl ChatMode {
    /// Parse a caller-supplied mode, case-insensitively.
    ///
    /// Values outside `{rag, direct}` are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "rag" => Ok(Self::Rag),
            "direct" => Ok(Self::Direct),
            _ => Err(Error::InvalidMode(raw.trim().to_string())),
        }
    }
}

/// Closed label set produced by the intent classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentLabel {
    /// The user wants a playbook authored from the documents
    PlaybookWriting,
    /// The user asks a question answerable from the documents
    Question,
    /// Anything else
    Other,
}

impl IntentLabel {
    /// Token the classifier is instructed to emit for this label
    pub fn token(&self) -> &'static str {
        match self {
            Self::PlaybookWriting => "playbook_writing",
            Self::Question => "question",
            Self::Other => "autre",
        }
    }

    /// Parse classifier output with case/whitespace normalization.
    ///
    /// Output that matches no token falls back to `Question`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "playbook_writing" => Self::PlaybookWriting,
            "question" => Self::Question,
            "autre" => Self::Other,
            _ => Self::Question,
        }
    }
}

/// Response strategy chosen for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Answer grounded in retrieved excerpts
    Grounded,
    /// Answer without retrieval
    Direct,
    /// Structured playbook generation from retrieved context
    Playbook,
}

impl Route {
    /// Wire label reported as the chat response's intent
    pub fn label(&self) -> &'static str {
        match self {
            Self::Grounded => "rag",
            Self::Direct => "direct",
            Self::Playbook => "playbook",
        }
    }

    /// Whether this route retrieves context before composing
    pub fn retrieves(&self) -> bool {
        !matches!(self, Self::Direct)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Decide the route. An explicit mode always wins; a classifier label applies
/// only when no mode was given; with neither, ground.
pub fn decide(mode: Option<ChatMode>, label: Option<IntentLabel>) -> Route {
    match (mode, label) {
        (Some(ChatMode::Rag), _) => Route::Grounded,
        (Some(ChatMode::Direct), _) => Route::Direct,
        (None, Some(IntentLabel::PlaybookWriting)) => Route::Playbook,
        (None, Some(IntentLabel::Question)) => Route::Grounded,
        (None, Some(IntentLabel::Other)) => Route::Direct,
        (None, None) => Route::Grounded,
    }
}

/// Usable-context gate: grounding requires more than `min_chars` characters
/// of concatenated retrieved text after trimming.
pub fn context_is_sufficient(context: &str, min_chars: usize) -> bool {
    context.trim().chars().count() > min_chars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse_accepts_known_values() {
        assert_eq!(ChatMode::parse("rag").unwrap(), ChatMode::Rag);
        assert_eq!(ChatMode::parse("RAG").unwrap(), ChatMode::Rag);
        assert_eq!(ChatMode::parse("  Direct ").unwrap(), ChatMode::Direct);
    }

    #[test]
    fn test_mode_parse_rejects_unknown_values() {
        assert!(matches!(
            ChatMode::parse("hybrid"),
            Err(Error::InvalidMode(m)) if m == "hybrid"
        ));
        assert!(ChatMode::parse("").is_err());
    }

    #[test]
    fn test_label_parse_normalizes() {
        assert_eq!(IntentLabel::parse("question"), IntentLabel::Question);
        assert_eq!(IntentLabel::parse(" QUESTION \n"), IntentLabel::Question);
        assert_eq!(
            IntentLabel::parse("Playbook_Writing"),
            IntentLabel::PlaybookWriting
        );
        assert_eq!(IntentLabel::parse("autre"), IntentLabel::Other);
    }

    #[test]
    fn test_label_parse_falls_back_to_question() {
        assert_eq!(IntentLabel::parse("banana"), IntentLabel::Question);
        assert_eq!(
            IntentLabel::parse("The label is: question"),
            IntentLabel::Question
        );
        assert_eq!(IntentLabel::parse(""), IntentLabel::Question);
    }

    #[test]
    fn test_decide_explicit_mode_wins() {
        assert_eq!(
            decide(Some(ChatMode::Rag), Some(IntentLabel::Other)),
            Route::Grounded
        );
        assert_eq!(
            decide(Some(ChatMode::Direct), Some(IntentLabel::PlaybookWriting)),
            Route::Direct
        );
    }

    #[test]
    fn test_decide_label_routes() {
        assert_eq!(
            decide(None, Some(IntentLabel::PlaybookWriting)),
            Route::Playbook
        );
        assert_eq!(decide(None, Some(IntentLabel::Question)), Route::Grounded);
        assert_eq!(decide(None, Some(IntentLabel::Other)), Route::Direct);
    }

    #[test]
    fn test_decide_defaults_to_grounded() {
        assert_eq!(decide(None, None), Route::Grounded);
    }

    #[test]
    fn test_decide_is_deterministic() {
        for _ in 0..10 {
            assert_eq!(
                decide(Some(ChatMode::Rag), None),
                decide(Some(ChatMode::Rag), None)
            );
            assert_eq!(
                decide(None, Some(IntentLabel::Other)),
                decide(None, Some(IntentLabel::Other))
            );
        }
    }

    #[test]
    fn test_context_gate_threshold() {
        let exactly_100 = "a".repeat(100);
        let just_over = "a".repeat(101);
        assert!(!context_is_sufficient("", 100));
        assert!(!context_is_sufficient("   \n  ", 100));
        assert!(!context_is_sufficient(&exactly_100, 100));
        assert!(context_is_sufficient(&just_over, 100));
    }

    #[test]
    fn test_context_gate_ignores_surrounding_whitespace() {
        let padded = format!("  {}  \n", "a".repeat(100));
        assert!(!context_is_sufficient(&padded, 100));
    }
}
