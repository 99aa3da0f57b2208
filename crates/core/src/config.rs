//! Configuration management.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The YAML config file (`.hipaa/config.yaml` in the workspace, or `HIPAA_CONFIG`)
//! - Environment variables (a `.env` file in the working directory is read first, if present)
//! - Command-line flags
//!
//! Relative paths in the configuration are resolved against the workspace.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generative model providers the LLM crate can construct.
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["groq", "ollama"];

/// Embedding providers the knowledge crate can construct.
pub const KNOWN_EMBEDDING_PROVIDERS: &[&str] = &["ollama", "hashed"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root; relative paths below are resolved against it
    pub workspace: PathBuf,

    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    pub corpus: CorpusSettings,

    pub index: IndexSettings,

    pub embedding: EmbeddingSettings,

    pub llm: LlmSettings,

    /// API key for the generative model, resolved from `llm.api_key_env`
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Where the source documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorpusSettings {
    pub dir: PathBuf,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

/// Index locations, chunking geometry and retrieval depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexSettings {
    /// Persistent (LanceDB) index directory
    pub persistent_dir: PathBuf,

    /// Loadable snapshot index directory
    pub snapshot_dir: PathBuf,

    /// Chunk window size in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Chunks retrieved per question
    pub top_k: usize,

    /// Allow the persistent backend; `false` always builds the snapshot
    pub persistent_backend: bool,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            persistent_dir: PathBuf::from("lance_db"),
            snapshot_dir: PathBuf::from("vector_db"),
            chunk_size: 500,
            chunk_overlap: 100,
            top_k: 4,
            persistent_backend: true,
        }
    }
}

/// Embedding model selection. Must not change between build and query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// "ollama" or "hashed"
    pub provider: String,

    /// Model identifier (all-minilm is MiniLM-L6-v2 served by Ollama)
    pub model: String,

    /// Declared output dimensionality
    pub dimensions: usize,

    /// Provider endpoint override
    pub endpoint: Option<String>,

    /// Maximum texts per provider request
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 64,
        }
    }
}

/// Generative model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// "groq" or "ollama"
    pub provider: String,

    /// Model identifier, before alias resolution
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Provider endpoint override
    pub endpoint: Option<String>,

    pub temperature: f32,

    pub max_tokens: u32,

    pub timeout_secs: u64,

    /// Deprecated model identifier -> replacement
    pub model_aliases: HashMap<String, String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            endpoint: None,
            temperature: 0.0,
            max_tokens: 1024,
            timeout_secs: 60,
            model_aliases: HashMap::new(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    corpus: Option<CorpusSettings>,
    index: Option<IndexSettings>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            corpus: CorpusSettings::default(),
            index: IndexSettings::default(),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration for a workspace.
    ///
    /// `workspace` and `config_file` come from the command line (which
    /// already falls back to `HIPAA_WORKSPACE` / `HIPAA_CONFIG`).
    ///
    /// Environment variables:
    /// - `HIPAA_CORPUS_DIR`: Corpus directory
    /// - `HIPAA_EMBEDDING_PROVIDER`, `HIPAA_EMBEDDING_MODEL`: Embedder selection
    /// - `HIPAA_DISABLE_PERSISTENT_INDEX`: Force the snapshot backend
    /// - `HIPAA_LLM_PROVIDER`: Generative provider
    /// - `GROQ_MODEL`: Generative model identifier
    /// - `OLLAMA_URL`: Endpoint for Ollama-served models without an explicit endpoint
    /// - value of `llm.apiKeyEnv` (default `GROQ_API_KEY`): API key
    /// - `RUST_LOG`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use hipaa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Corpus: {:?}", config.corpus_dir());
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        load_dotenv()?;

        let mut config = Self::default();
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        match config_file {
            Some(path) => config.merge_yaml(&path)?,
            None => {
                let default_path = config.hipaa_dir().join("config.yaml");
                if default_path.exists() {
                    config.merge_yaml(&default_path)?;
                }
            }
        }

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(corpus) = file.corpus {
            self.corpus = corpus;
        }
        if let Some(index) = file.index {
            self.index = index;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(llm) = file.llm {
            self.llm = llm;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self.config_file = Some(path.to_path_buf());
        Ok(())
    }

    /// Apply environment overrides using the given lookup.
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("HIPAA_CORPUS_DIR") {
            self.corpus.dir = PathBuf::from(dir);
        }
        if let Some(provider) = lookup("HIPAA_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = lookup("HIPAA_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(flag) = lookup("HIPAA_DISABLE_PERSISTENT_INDEX") {
            if is_truthy(&flag) {
                self.index.persistent_backend = false;
            }
        }
        if let Some(provider) = lookup("HIPAA_LLM_PROVIDER") {
            self.llm.provider = provider;
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            if self.embedding.endpoint.is_none() && self.embedding.provider == "ollama" {
                self.embedding.endpoint = Some(url.clone());
            }
            if self.llm.endpoint.is_none() && self.llm.provider == "ollama" {
                self.llm.endpoint = Some(url);
            }
        }
        if let Some(model) = lookup("GROQ_MODEL") {
            self.llm.model = model;
        }

        self.api_key = lookup(&self.llm.api_key_env).filter(|key| !key.trim().is_empty());

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(
        mut self,
        corpus_dir: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(dir) = corpus_dir {
            self.corpus.dir = dir;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a configured path against the workspace.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Directory holding workspace-local state (`.hipaa/`).
    pub fn hipaa_dir(&self) -> PathBuf {
        self.workspace.join(".hipaa")
    }

    /// Directory searched for prompt overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.hipaa_dir().join("prompts")
    }

    pub fn corpus_dir(&self) -> PathBuf {
        self.resolve(&self.corpus.dir)
    }

    pub fn persistent_index_dir(&self) -> PathBuf {
        self.resolve(&self.index.persistent_dir)
    }

    pub fn snapshot_index_dir(&self) -> PathBuf {
        self.resolve(&self.index.snapshot_dir)
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.index.chunk_size == 0 {
            return Err(AppError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }

        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }

        if self.index.top_k == 0 {
            return Err(AppError::Config("topK must be greater than zero".to_string()));
        }

        Ok(())
    }

    /// Validate that the generative provider can authenticate.
    ///
    /// Kept apart from [`AppConfig::validate`] because building an index
    /// never talks to the generative model.
    pub fn validate_llm_credentials(&self) -> AppResult<()> {
        if self.llm.provider == "groq" && self.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.llm.api_key_env
            )));
        }
        Ok(())
    }
}

/// Read `.env` from the working directory if there is one.
fn load_dotenv() -> AppResult<()> {
    match dotenv::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(AppError::Config(format!("Failed to read .env file: {}", e))),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
