use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::infrastructure::http_client::DEFAULT_BASE_URL;

/// Default filename used to persist configuration within the data directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Embedding backends compiled into the binary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingBackend {
    /// Lightweight deterministic hash embedder (always available).
    Simple,
    /// Semantic embeddings powered by FastEmbed (feature gated).
    #[cfg(feature = "fastembed-engine")]
    FastEmbed,
}

impl EmbeddingBackend {
    pub fn id(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple => "simple",
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed => "fastembed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple => "Deterministic Hash (offline)",
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed => "FastEmbed (semantic)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingBackend::Simple => SIMPLE_MODEL,
            #[cfg(feature = "fastembed-engine")]
            EmbeddingBackend::FastEmbed => FASTEMBED_MODEL,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "simple" => Some(EmbeddingBackend::Simple),
            #[cfg(feature = "fastembed-engine")]
            "fastembed" => Some(EmbeddingBackend::FastEmbed),
            _ => None,
        }
    }
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        #[cfg(feature = "fastembed-engine")]
        {
            EmbeddingBackend::FastEmbed
        }
        #[cfg(not(feature = "fastembed-engine"))]
        {
            EmbeddingBackend::Simple
        }
    }
}

/// Execution device requested for embedding inference.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    #[default]
    Cuda,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Cuda => "cuda",
        }
    }

    /// Device inference will actually run on in this build. CUDA needs the
    /// `cuda` feature; without it requests fall back to the CPU.
    pub fn effective(self) -> Device {
        if self == Device::Cuda && !cfg!(feature = "cuda") {
            Device::Cpu
        } else {
            self
        }
    }
}

/// Complete configuration payload shared by the index builder and query engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_model_name: String,
    /// Only consulted by the simple backend; semantic models report their own.
    pub embedding_dimensions: usize,
    pub embedding_device: Device,
    pub normalize_embeddings: bool,
    pub vector_index_path: PathBuf,
    pub retriever_k: usize,
    /// Results scoring below this cosine similarity are dropped before formatting.
    pub min_relevance: Option<f32>,
    pub llm_model: String,
    pub llm_base_url: String,
    pub llm_context_window: usize,
    pub benchmark_output: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = EmbeddingBackend::default();
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            batch_size: 10_000,
            embedding_backend: backend,
            embedding_model_name: backend.default_model().to_string(),
            embedding_dimensions: 256,
            embedding_device: Device::default(),
            normalize_embeddings: true,
            vector_index_path: PathBuf::from("vectorDB"),
            retriever_k: 2,
            min_relevance: None,
            llm_model: "llama3.1:70b".to_string(),
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            llm_context_window: 10_000,
            benchmark_output: PathBuf::from("benchmark_results.txt"),
        }
    }
}

impl AppConfig {
    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let bytes = fs::read(path).map_err(|err| {
            DomainError::config(format!("failed to read {}: {err}", path.display()))
        })?;
        let config: AppConfig = serde_json::from_slice(&bytes).map_err(|err| {
            DomainError::config(format!("failed to parse {}: {err}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Ensure the backing directory exists and write the JSON payload.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<(), DomainError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                DomainError::config(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        let payload = serde_json::to_vec_pretty(self)
            .map_err(|err| DomainError::config(format!("failed to encode config: {err}")))?;
        fs::write(path, payload).map_err(|err| {
            DomainError::config(format!("failed to write {}: {err}", path.display()))
        })
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_size == 0 {
            return Err(DomainError::config("chunk_size must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.batch_size == 0 {
            return Err(DomainError::config("batch_size must be greater than zero"));
        }
        if self.retriever_k == 0 {
            return Err(DomainError::config("retriever_k must be greater than zero"));
        }
        if self.llm_context_window == 0 {
            return Err(DomainError::config(
                "llm_context_window must be greater than zero",
            ));
        }
        if self.embedding_model_name.trim().is_empty() {
            return Err(DomainError::config("embedding_model_name cannot be empty"));
        }
        if let Some(threshold) = self.min_relevance {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(DomainError::config(format!(
                    "min_relevance ({threshold}) must lie within [-1, 1]"
                )));
            }
        }
        Ok(())
    }
}

const SIMPLE_MODEL: &str = "assembly-rag/simple-hash";

#[cfg(feature = "fastembed-engine")]
const FASTEMBED_MODEL: &str = "BAAI/bge-m3";
