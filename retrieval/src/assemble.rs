//! Context assembly: ranked results to a generation prompt.

use crate::retriever::RetrievalResult;

/// Delimiter between context passages.
pub const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

/// Fixed sentence the generation step must emit when the context does not
/// contain the answer.
pub const FALLBACK_ANSWER: &str = "No answer found in the provided context.";

/// Formats ranked retrieval results into a bounded generation prompt.
///
/// Pure formatting: no ranking or filtering happens here. Result order is a
/// ranking signal the generation step may use implicitly, so it is preserved
/// exactly as the retriever produced it.
#[derive(Debug, Clone, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    /// Create an assembler.
    pub fn new() -> Self {
        Self
    }

    /// Render the context block: each passage labeled with its source.
    pub fn format_context(&self, results: &[RetrievalResult]) -> String {
        results
            .iter()
            .map(|r| format!("[{}]\n{}", r.source, r.text))
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER)
    }

    /// Wrap the query and context into the instruction template.
    ///
    /// With zero results the context section is empty but the instruction
    /// and fallback text remain, so the generation step degrades to the
    /// fixed "no answer" sentence instead of fabricating content.
    pub fn assemble(&self, query: &str, results: &[RetrievalResult]) -> String {
        let context = self.format_context(results);
        format!(
            "Answer the question ONLY using the context:\n\n\
             QUESTION:\n{query}\n\n\
             CONTEXT:\n{context}\n\n\
             If the answer is not in the context, say:\n\
             \"{FALLBACK_ANSWER}\"\n"
        )
    }
}
