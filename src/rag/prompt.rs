//! Prompt assembly for grounded answers

use crate::store::SearchResult;

/// Header placed above the retrieved passages
pub const CONTEXT_HEADER: &str = "Context from relevant documents:";

/// Instruction appended after the user's question
pub const ANSWER_INSTRUCTION: &str = "Answer based on the provided context.";

/// Builds the augmented prompt sent to the model
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    header: String,
    instruction: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            header: CONTEXT_HEADER.to_string(),
            instruction: ANSWER_INSTRUCTION.to_string(),
        }
    }

    /// Number passages `Document 1:`, `Document 2:`, ... in the given order
    pub fn context_block(&self, passages: &[SearchResult]) -> String {
        let mut block = format!("{}\n\n", self.header);
        for (idx, passage) in passages.iter().enumerate() {
            block.push_str(&format!("Document {}:\n{}\n\n", idx + 1, passage.text));
        }
        block
    }

    /// Context block, then the literal query, then the instruction
    pub fn build(&self, query: &str, passages: &[SearchResult]) -> String {
        format!(
            "{}\nUser question: {}\n\n{}",
            self.context_block(passages),
            query,
            self.instruction
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Metadata;

    fn passage(id: &str, text: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            distance: 0.0,
            text: text.to_string(),
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_passages_numbered_in_order() {
        let builder = PromptBuilder::new();
        let block = builder.context_block(&[passage("b", "second best"), passage("a", "third")]);

        let first = block.find("Document 1:\nsecond best").unwrap();
        let second = block.find("Document 2:\nthird").unwrap();
        assert!(first < second);
        assert!(!block.contains("Document 3:"));
    }

    #[test]
    fn test_empty_context_still_has_question() {
        let builder = PromptBuilder::new();
        let prompt = builder.build("What is Rust?", &[]);

        assert!(prompt.starts_with(CONTEXT_HEADER));
        assert!(!prompt.contains("Document 1:"));
        assert!(prompt.contains("User question: What is Rust?"));
        assert!(prompt.ends_with(ANSWER_INSTRUCTION));
    }

    #[test]
    fn test_query_follows_context() {
        let builder = PromptBuilder::new();
        let prompt = builder.build("q?", &[passage("a", "fact")]);
        assert!(prompt.find("fact").unwrap() < prompt.find("User question: q?").unwrap());
    }
}
