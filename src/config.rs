//! Configuration module for the document retrieval service.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.docrag/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `DOCRAG_` and use double
//! underscores to separate nested levels:
//! - `DOCRAG_CHUNKING__CHUNK_SIZE=500` sets `chunking.chunk_size`
//! - `DOCRAG_SERVER__BIND=0.0.0.0:8000` sets `server.bind`
//! - `DOCRAG_SEMANTIC_SEARCH__BACKEND=hashing` sets `semantic_search.backend`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::documents::ChunkingConfig;
use crate::error::{RagError, RagResult};
use crate::storage::SNAPSHOT_FILE;

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".docrag";

const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "DOCRAG_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding the index snapshot
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Workspace root directory (where .docrag is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub semantic_search: SemanticSearchConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Answer generation settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which embedder implementation to load.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX model via fastembed.
    #[default]
    FastEmbed,
    /// Deterministic feature hashing, no download.
    Hashing,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SemanticSearchConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector size for the hashing backend. fastembed models report their own.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Where downloaded models are cached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    #[serde(default = "default_false")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Number of chunks returned when the caller does not ask for a count
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GenerationConfig {
    /// When false, queries return sources with a null answer
    #[serde(default = "default_false")]
    pub enabled: bool,

    /// OpenAI-compatible chat completions URL
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Rendered prompts are cut to this many characters
    #[serde(default = "default_prompt_char_limit")]
    pub prompt_char_limit: usize,

    /// Environment variable holding the bearer token, if the endpoint needs one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Browser origins allowed to call the API
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Accepted upload file extensions, with the leading dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for every target not listed in `modules`
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `retrieve = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".docrag/index")
}
fn default_false() -> bool {
    false
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_dimension() -> usize {
    384
}
fn default_top_k() -> usize {
    3
}
fn default_generation_endpoint() -> String {
    "http://localhost:11434/v1/chat/completions".to_string()
}
fn default_generation_model() -> String {
    "llama3.2".to_string()
}
fn default_max_tokens() -> u32 {
    200
}
fn default_prompt_char_limit() -> usize {
    1000
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_allowed_extensions() -> Vec<String> {
    let mut extensions = vec![".txt".to_string(), ".md".to_string()];
    if cfg!(feature = "pdf") {
        extensions.push(".pdf".to_string());
    }
    extensions
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            workspace_root: None,
            chunking: ChunkingConfig::default(),
            semantic_search: SemanticSearchConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_generation_endpoint(),
            model: default_generation_model(),
            max_tokens: default_max_tokens(),
            prompt_char_limit: default_prompt_char_limit(),
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

/// `DOCRAG_A__B_C` becomes `a.b_c`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources, discovering `.docrag/` upward
    /// from the current directory.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_in(&start)
    }

    /// Like [`Settings::load`], but discovery starts at `start`.
    pub fn load_in(start: &Path) -> Result<Self, Box<figment::Error>> {
        let workspace = Self::find_workspace_root(start);
        let config_path = workspace
            .as_deref()
            .unwrap_or(start)
            .join(CONFIG_DIR)
            .join(CONFIG_FILE);

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = workspace;
                }
                settings
            })
    }

    /// Load configuration from a specific file, still honouring env overrides.
    ///
    /// A file at `<root>/.docrag/settings.toml` anchors relative paths at `<root>`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        let workspace = Self::workspace_of_config_file(path);

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = workspace;
                }
                settings
            })
    }

    fn workspace_of_config_file(path: &Path) -> Option<PathBuf> {
        let config_dir = path.parent()?;
        if config_dir.file_name()? != CONFIG_DIR {
            return None;
        }
        match config_dir.parent()? {
            root if root.as_os_str().is_empty() => Some(PathBuf::from(".")),
            root => Some(root.to_path_buf()),
        }
    }

    /// Nearest ancestor of `start` (inclusive) that contains `.docrag/`.
    pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Check values that serde cannot express.
    pub fn validate(&self) -> RagResult<()> {
        self.chunking.validate()?;

        if self.semantic_search.backend == EmbeddingBackend::Hashing
            && self.semantic_search.dimension == 0
        {
            return Err(RagError::Configuration(
                "semantic_search.dimension must be greater than zero".to_string(),
            ));
        }

        if self.generation.enabled && self.generation.prompt_char_limit == 0 {
            return Err(RagError::Configuration(
                "generation.prompt_char_limit must be greater than zero".to_string(),
            ));
        }

        for ext in &self.server.allowed_extensions {
            if !ext.starts_with('.') {
                return Err(RagError::Configuration(format!(
                    "server.allowed_extensions entry '{ext}' must start with '.'"
                )));
            }
        }

        Ok(())
    }

    /// Index directory, resolved against the workspace root when relative.
    pub fn index_dir(&self) -> PathBuf {
        match &self.workspace_root {
            Some(root) if self.index_path.is_relative() => root.join(&self.index_path),
            _ => self.index_path.clone(),
        }
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.index_dir().join(SNAPSHOT_FILE)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write a default settings file under `dir/.docrag/`.
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let settings = Settings {
            workspace_root: Some(dir.to_path_buf()),
            ..Settings::default()
        };
        settings.save(&config_path)?;

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.index_path, PathBuf::from(".docrag/index"));
        assert_eq!(settings.chunking.chunk_size, 1000);
        assert_eq!(settings.chunking.overlap, 200);
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.semantic_search.model, "AllMiniLML6V2");
        assert_eq!(settings.generation.max_tokens, 200);
        assert_eq!(settings.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(settings.logging.default, "warn");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[chunking]
chunk_size = 500
overlap = 50

[semantic_search]
backend = "hashing"
dimension = 64

[server]
allowed_extensions = [".txt"]

[logging.modules]
retrieve = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.chunking, ChunkingConfig::new(500, 50));
        assert_eq!(settings.semantic_search.backend, EmbeddingBackend::Hashing);
        assert_eq!(settings.semantic_search.dimension, 64);
        assert_eq!(settings.server.allowed_extensions, vec![".txt"]);
        assert_eq!(settings.logging.modules["retrieve"], "debug");
        // Untouched sections keep their defaults
        assert_eq!(settings.server.bind, "127.0.0.1:8000");
        assert_eq!(settings.retrieval.top_k, 3);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.retrieval.top_k = 7;
        settings.generation.enabled = true;
        settings.generation.api_key_env = Some("MY_KEY".to_string());

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.retrieval.top_k, 7);
        assert!(loaded.generation.enabled);
        assert_eq!(loaded.generation.api_key_env.as_deref(), Some("MY_KEY"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.chunking = ChunkingConfig::new(100, 100);
        assert!(matches!(
            settings.validate(),
            Err(RagError::Configuration(_))
        ));

        let mut settings = Settings::default();
        settings.server.allowed_extensions = vec!["txt".to_string()];
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.semantic_search.backend = EmbeddingBackend::Hashing;
        settings.semantic_search.dimension = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_workspace_discovery() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let nested = root.join("docs").join("guides");
        fs::create_dir_all(&nested).unwrap();

        assert!(Settings::find_workspace_root(&nested).is_none());

        let config_path = Settings::init_config_file(root, false).unwrap();
        assert_eq!(config_path, root.join(".docrag").join("settings.toml"));
        assert_eq!(Settings::find_workspace_root(&nested).as_deref(), Some(root));

        let settings = Settings::load_in(&nested).unwrap();
        assert_eq!(settings.workspace_root.as_deref(), Some(root));
        assert_eq!(
            settings.snapshot_path(),
            root.join(".docrag").join("index").join("snapshot.json")
        );
    }

    #[test]
    fn test_explicit_config_file_anchors_index_at_its_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("project");
        let config_path = root.join(".docrag").join("settings.toml");
        fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        fs::write(&config_path, "[retrieval]\ntop_k = 5\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.workspace_root.as_deref(), Some(root.as_path()));
        assert_eq!(
            settings.snapshot_path(),
            root.join(".docrag").join("index").join("snapshot.json")
        );

        // Outside a `.docrag` directory nothing is inferred
        let loose = temp_dir.path().join("custom.toml");
        fs::write(&loose, "[retrieval]\ntop_k = 4\n").unwrap();
        let settings = Settings::load_from(&loose).unwrap();
        assert!(settings.workspace_root.is_none());
        assert_eq!(settings.index_dir(), PathBuf::from(".docrag/index"));

        assert_eq!(
            Settings::workspace_of_config_file(Path::new(".docrag/settings.toml")),
            Some(PathBuf::from("."))
        );
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(Settings::init_config_file(temp_dir.path(), false).is_err());
        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }

    #[test]
    fn test_absolute_index_path_ignores_workspace() {
        let settings = Settings {
            index_path: PathBuf::from("/var/lib/docrag"),
            workspace_root: Some(PathBuf::from("/home/user/project")),
            ..Settings::default()
        };
        assert_eq!(settings.index_dir(), PathBuf::from("/var/lib/docrag"));
    }
}
