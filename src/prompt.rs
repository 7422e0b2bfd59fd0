//! Grounding prompt assembly
//!
//! Pure and stateless: the same question and retrieval results always
//! produce byte-identical prompt text, which keeps synthesis cacheable
//! and testable. The template instructs the model to answer strictly
//! from the provided context.

use crate::retrieval::RetrievalResult;

/// Separator between chunk texts in the context block
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Assembles the grounding prompt for answer synthesis
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the prompt from the question and the retrieved chunks,
    /// in rank order
    pub fn build(question: &str, results: &[RetrievalResult]) -> String {
        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER);

        format!(
            "Answer the question by writing a quick summary based only on the following context:\n\
             \n\
             {context}\n\
             \n\
             \n\
             ---\n\
             Answer the question by writing a quick summary based on the above context: {question}"
        )
    }
}
