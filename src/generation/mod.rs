//! Answer generation on top of retrieval.
//!
//! Retrieved chunk texts are joined into a prompt, cut to a character
//! budget, and sent to a chat-completions endpoint.

mod generator;
mod pipeline;
mod prompt;

pub use generator::{Generator, HttpGenerator};
pub use pipeline::{Answer, QaPipeline, run_blocking};
pub use prompt::{DEFAULT_TEMPLATE, PromptTemplate, truncate_chars};
