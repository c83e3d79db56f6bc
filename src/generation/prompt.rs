//! Prompt templates for the grounded, direct, and playbook routes

use crate::retrieval::ScoredChunk;
use crate::types::ChatTurn;

/// Answer returned when grounded mode finds no usable context. Sent verbatim,
/// without a model call.
pub const NO_CONTEXT_FALLBACK: &str = "I could not find any relevant information in the supplied \
documents. Please add documents containing the answer you are looking for.";

/// Prompt builder for the response strategies
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate retrieved chunk texts into the context block
    pub fn build_context(results: &[ScoredChunk]) -> String {
        results
            .iter()
            .map(|result| result.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render conversation history, one line per turn. Turns whose content
    /// trims to nothing are dropped; order is preserved.
    pub fn render_history(history: &[ChatTurn]) -> String {
        history
            .iter()
            .filter_map(|turn| {
                let content = turn.content.trim();
                if content.is_empty() {
                    None
                } else {
                    Some(format!("{}: {}", turn.role.label(), content))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn conversation_block(history_text: &str) -> String {
        if history_text.is_empty() {
            String::new()
        } else {
            format!("Conversation history:\n{}\n\n", history_text)
        }
    }

    /// Build the grounded-answer prompt
    pub fn build_grounded_prompt(message: &str, context: &str, history_text: &str) -> String {
        format!(
            r#"{conversation}Here are excerpts from documents:
{context}

Answer the following question using only these excerpts:
{message}

If the excerpts do not contain the requested information, say so explicitly instead of inventing an answer."#,
            conversation = Self::conversation_block(history_text),
            context = context,
            message = message
        )
    }

    /// Build the direct-answer prompt
    pub fn build_direct_prompt(message: &str, history_text: &str) -> String {
        format!(
            r#"{conversation}Latest user message:
{message}

Respond helpfully and concisely."#,
            conversation = Self::conversation_block(history_text),
            message = message
        )
    }

    /// Build the playbook-authoring prompt. `reference` names the document
    /// governing the expected playbook format.
    pub fn build_playbook_prompt(message: &str, context: &str, reference: &str) -> String {
        format!(
            r#"You are a playbook author. Write a playbook following the format defined in {reference}.

Here are excerpts from documents to draw on:
{context}

Request:
{message}

Output only the playbook itself, with no surrounding commentary."#,
            reference = reference,
            context = context,
            message = message
        )
    }

    /// Build the intent-classification prompt. The only valid outputs are the
    /// three label tokens.
    pub fn build_classifier_prompt(message: &str) -> String {
        format!(
            r#"Classify the user message into exactly one of these categories:
- playbook_writing: the user asks you to write or draft a playbook
- question: the user asks a question to be answered from documents
- autre: anything else

Reply with the single category token and nothing else.

Message:
{message}

Category:"#,
            message = message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkMetadata};

    fn scored(text: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk::new(text.to_string(), ChunkMetadata::new("doc.txt")),
            score: 0.9,
        }
    }

    #[test]
    fn test_build_context_joins_with_blank_lines() {
        let context = PromptBuilder::build_context(&[scored("first"), scored("second")]);
        assert_eq!(context, "first\n\nsecond");
        assert_eq!(PromptBuilder::build_context(&[]), "");
    }

    #[test]
    fn test_render_history_drops_blank_turns() {
        let history = vec![
            ChatTurn::user("What color is the sky?"),
            ChatTurn::assistant("   "),
            ChatTurn::assistant("Blue."),
            ChatTurn::user(""),
        ];
        let rendered = PromptBuilder::render_history(&history);
        assert_eq!(rendered, "User: What color is the sky?\nAssistant: Blue.");
    }

    #[test]
    fn test_render_history_preserves_order() {
        let history = vec![
            ChatTurn::user("one"),
            ChatTurn::assistant("two"),
            ChatTurn::user("three"),
        ];
        let rendered = PromptBuilder::render_history(&history);
        assert_eq!(rendered, "User: one\nAssistant: two\nUser: three");
    }

    #[test]
    fn test_grounded_prompt_embeds_context_and_question() {
        let prompt =
            PromptBuilder::build_grounded_prompt("What color is the sky?", "The sky is blue.", "");
        assert!(prompt.contains("The sky is blue."));
        assert!(prompt.contains("What color is the sky?"));
        assert!(prompt.contains("only these excerpts"));
        assert!(!prompt.contains("Conversation history:"));
    }

    #[test]
    fn test_grounded_prompt_prepends_history_when_present() {
        let prompt = PromptBuilder::build_grounded_prompt("next?", "ctx", "User: earlier");
        assert!(prompt.starts_with("Conversation history:\nUser: earlier\n\n"));
    }

    #[test]
    fn test_direct_prompt_has_no_context_block() {
        let prompt = PromptBuilder::build_direct_prompt("Hello", "");
        assert!(prompt.contains("Hello"));
        assert!(!prompt.contains("excerpts"));
    }

    #[test]
    fn test_playbook_prompt_names_reference_and_suppresses_commentary() {
        let prompt =
            PromptBuilder::build_playbook_prompt("incident response", "ctx", "the authoring guide");
        assert!(prompt.contains("the authoring guide"));
        assert!(prompt.contains("no surrounding commentary"));
        assert!(prompt.contains("incident response"));
    }

    #[test]
    fn test_classifier_prompt_lists_every_label() {
        let prompt = PromptBuilder::build_classifier_prompt("write me a playbook");
        assert!(prompt.contains("playbook_writing"));
        assert!(prompt.contains("question"));
        assert!(prompt.contains("autre"));
    }
}
