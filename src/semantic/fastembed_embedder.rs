//! ONNX sentence embeddings through fastembed.

use std::path::PathBuf;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::embedder::{Embedder, ensure_batch_len};
use crate::config::SemanticSearchConfig;
use crate::error::{RagError, RagResult};

/// Embedder backed by a local fastembed model.
pub struct FastEmbedder {
    /// The embedding model (wrapped in Mutex for interior mutability)
    model: Mutex<TextEmbedding>,

    model_name: String,

    /// Probed once at load time
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedder {
    /// Load the default model (AllMiniLML6V2) into the default cache directory.
    pub fn new() -> RagResult<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2, Some(models_dir()), false)
    }

    /// Load the model named in settings.
    pub fn from_settings(config: &SemanticSearchConfig) -> RagResult<Self> {
        let model = parse_model(&config.model).ok_or_else(|| {
            RagError::Configuration(format!(
                "unknown embedding model '{}' (supported: {})",
                config.model,
                SUPPORTED_MODELS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        let cache_dir = config.cache_dir.clone().unwrap_or_else(models_dir);
        Self::with_model(model, Some(cache_dir), config.show_download_progress)
    }

    /// Load a specific model.
    ///
    /// Any failure here is fatal for the process: the model is never
    /// reloaded on a later call.
    pub fn with_model(
        model: EmbeddingModel,
        cache_dir: Option<PathBuf>,
        show_download_progress: bool,
    ) -> RagResult<Self> {
        let model_name = model_to_string(&model);
        tracing::info!(target: "semantic", "loading embedding model {model_name}");

        let mut options =
            InitOptions::new(model).with_show_download_progress(show_download_progress);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let mut text_model = TextEmbedding::try_new(options).map_err(|e| {
            RagError::ModelUnavailable(format!("failed to initialize {model_name}: {e}"))
        })?;

        // Get dimensions by generating a test embedding
        let probe = text_model
            .embed(vec!["test"], None)
            .map_err(|e| RagError::ModelUnavailable(format!("{model_name} probe failed: {e}")))?;
        let dimension = probe.first().map(Vec::len).ok_or_else(|| {
            RagError::ModelUnavailable(format!("{model_name} returned no probe embedding"))
        })?;

        tracing::info!(target: "semantic", "embedding model ready: {model_name} ({dimension} dimensions)");

        Ok(Self {
            model: Mutex::new(text_model),
            model_name,
            dimension,
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[&str]) -> RagResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self
            .model
            .lock()
            .embed(texts.to_vec(), None)
            .map_err(|e| RagError::Embedding(e.to_string()))?;

        ensure_batch_len(texts.len(), &embeddings)?;
        Ok(embeddings)
    }
}

/// Default model cache directory.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".docrag"))
        .join("docrag")
        .join("models")
}

/// Canonical names of the models accepted in settings.
const SUPPORTED_MODELS: &[(&str, EmbeddingModel)] = &[
    ("AllMiniLML6V2", EmbeddingModel::AllMiniLML6V2),
    ("AllMiniLML12V2", EmbeddingModel::AllMiniLML12V2),
    ("BGESmallENV15", EmbeddingModel::BGESmallENV15),
    ("BGEBaseENV15", EmbeddingModel::BGEBaseENV15),
    ("BGELargeENV15", EmbeddingModel::BGELargeENV15),
    ("MultilingualE5Small", EmbeddingModel::MultilingualE5Small),
    ("MultilingualE5Base", EmbeddingModel::MultilingualE5Base),
    ("ParaphraseMLMiniLML12V2", EmbeddingModel::ParaphraseMLMiniLML12V2),
    ("NomicEmbedTextV15", EmbeddingModel::NomicEmbedTextV15),
];

/// Hub organisations that may prefix a model id, e.g. `BAAI/bge-small-en-v1.5`.
const HUB_PREFIXES: &[&str] = &["sentencetransformers", "baai", "intfloat", "nomicai"];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve a model name from settings.
///
/// Accepts canonical names (`AllMiniLML6V2`) and hub ids
/// (`sentence-transformers/all-MiniLM-L6-v2`, `all-MiniLM-L6-v2`).
pub fn parse_model(name: &str) -> Option<EmbeddingModel> {
    let mut wanted = normalize(name);
    for prefix in HUB_PREFIXES {
        if let Some(rest) = wanted.strip_prefix(prefix) {
            wanted = rest.to_string();
            break;
        }
    }

    SUPPORTED_MODELS
        .iter()
        .find(|(canonical, _)| normalize(canonical) == wanted)
        .map(|(_, model)| model.clone())
}

/// Canonical name for a model.
pub fn model_to_string(model: &EmbeddingModel) -> String {
    SUPPORTED_MODELS
        .iter()
        .find(|(_, m)| m == model)
        .map(|(name, _)| (*name).to_string())
        .unwrap_or_else(|| format!("{model:?}"))
}
