//! Retrieve-then-generate question answering.

use std::sync::Arc;

use serde::Serialize;

use super::generator::{Generator, HttpGenerator};
use super::prompt::{DEFAULT_TEMPLATE, PromptTemplate};
use crate::config::GenerationConfig;
use crate::error::{RagError, RagResult};
use crate::retrieve::Retriever;
use crate::vector::SearchHit;

/// Answer plus the chunks it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// `None` when no generator is configured.
    pub answer: Option<String>,
    pub sources: Vec<SearchHit>,
}

/// Run blocking retriever work off the async executor.
pub async fn run_blocking<T, F>(f: F) -> RagResult<T>
where
    F: FnOnce() -> RagResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(RagError::ModelUnavailable(format!("blocking task cancelled: {e}"))),
    }
}

#[derive(Clone)]
pub struct QaPipeline {
    retriever: Arc<Retriever>,
    generator: Option<Arc<dyn Generator>>,
    template: PromptTemplate,
}

impl std::fmt::Debug for QaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaPipeline")
            .field("retriever", &self.retriever)
            .field("generator", &self.generator.as_ref().map(|g| g.model_name()))
            .field("template", &self.template)
            .finish()
    }
}

impl QaPipeline {
    pub fn new(
        retriever: Arc<Retriever>,
        generator: Option<Arc<dyn Generator>>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            retriever,
            generator,
            template,
        }
    }

    /// Attach an [`HttpGenerator`] when generation is enabled.
    pub fn from_settings(retriever: Arc<Retriever>, config: &GenerationConfig) -> RagResult<Self> {
        let generator: Option<Arc<dyn Generator>> = if config.enabled {
            Some(Arc::new(HttpGenerator::from_settings(config)?))
        } else {
            None
        };
        let template = PromptTemplate::new(DEFAULT_TEMPLATE, config.prompt_char_limit);
        Ok(Self::new(retriever, generator, template))
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Retrieve on the blocking pool.
    pub async fn retrieve(&self, question: &str, k: usize) -> RagResult<Vec<SearchHit>> {
        let retriever = Arc::clone(&self.retriever);
        let question = question.to_string();
        run_blocking(move || retriever.retrieve(&question, k)).await
    }

    /// Retrieve `k` sources and, if a generator is attached, answer from them.
    pub async fn answer(&self, question: &str, k: usize) -> RagResult<Answer> {
        let sources = self.retrieve(question, k).await?;

        let Some(generator) = &self.generator else {
            return Ok(Answer {
                answer: None,
                sources,
            });
        };

        let prompt = self.template.render(question, &sources);
        let text = generator.generate(&prompt).await?;

        Ok(Answer {
            answer: Some(text.trim().to_string()),
            sources,
        })
    }
}
