//! Prompt rendering for answer generation.

use crate::vector::SearchHit;

/// Template used unless settings provide another one.
pub const DEFAULT_TEMPLATE: &str = "You are a helpful assistant. Based on the following context, \
answer the question concisely and accurately.\n\nContext: {context}\n\nQuestion: {question}\n\nAnswer:";

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// A prompt template with `{context}` and `{question}` slots and a
/// character budget for the rendered result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    char_limit: usize,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE, 1000)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, char_limit: usize) -> Self {
        Self {
            template: template.into(),
            char_limit,
        }
    }

    pub fn char_limit(&self) -> usize {
        self.char_limit
    }

    /// Fill the template with the hit texts (newline-joined) and the question,
    /// then cut the result to the character budget.
    ///
    /// Substituted values are never rescanned for slots.
    pub fn render(&self, question: &str, hits: &[SearchHit]) -> String {
        let context = hits.iter().map(SearchHit::text).collect::<Vec<_>>().join("\n");

        let mut prompt = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut question_end = 0;

        for (i, part) in self.template.split(CONTEXT_SLOT).enumerate() {
            if i > 0 {
                prompt.push_str(&context);
            }
            for (j, piece) in part.split(QUESTION_SLOT).enumerate() {
                if j > 0 {
                    prompt.push_str(question);
                    question_end = prompt.len();
                }
                prompt.push_str(piece);
            }
        }

        let cut = truncate_chars(&prompt, self.char_limit).len();
        if cut < prompt.len() {
            if cut < question_end {
                tracing::warn!(
                    target: "generation",
                    "prompt cut to {} characters drops part of the question; \
                     raise generation.prompt_char_limit or lower top_k",
                    self.char_limit
                );
            } else {
                tracing::debug!(target: "generation", "prompt cut to {} characters", self.char_limit);
            }
            prompt.truncate(cut);
        }

        prompt
    }
}

/// The longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
