use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod settings;

use application::services::{
    EmbeddingEngine, IndexBuilder, IndexConfig, LanguageModel, QueryConfig, QueryEngine,
    TextChunker, VectorIndex, VectorStore,
};
#[cfg(feature = "fastembed-engine")]
use infrastructure::FastEmbedEngine;
use infrastructure::{OllamaClient, SimpleEmbedEngine, SledVectorStore};
use settings::{AppConfig, EmbeddingBackend, CONFIG_FILENAME};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "ASSEMBLY_RAG_LOG";

/// Handles shared by the build and query pipelines.
pub struct AppHandles {
    pub config: AppConfig,
    pub index: Arc<VectorIndex>,
}

impl AppHandles {
    pub fn index_builder(&self) -> Result<IndexBuilder> {
        let chunker = TextChunker::try_new(self.config.chunk_size, self.config.chunk_overlap)
            .map_err(|err| anyhow!(err))?;
        Ok(IndexBuilder::new(
            Arc::clone(&self.index),
            chunker,
            self.config.batch_size,
        ))
    }

    /// Query engine answering through the configured Ollama model.
    pub fn query_engine(&self) -> QueryEngine {
        let client = OllamaClient::new(
            self.config.llm_base_url.clone(),
            self.config.llm_model.clone(),
        );
        info!(
            model = client.model(),
            base_url = %self.config.llm_base_url,
            "using ollama language model"
        );
        self.query_engine_with(Arc::new(client))
    }

    pub fn query_engine_with(&self, model: Arc<dyn LanguageModel>) -> QueryEngine {
        QueryEngine::new(
            Arc::clone(&self.index),
            model,
            QueryConfig {
                retriever_k: self.config.retriever_k,
                min_relevance: self.config.min_relevance,
                llm_context_window: self.config.llm_context_window,
            },
        )
    }
}

/// Install the stderr subscriber once; later calls are no-ops.
pub fn init_tracing() {
    static INIT: std::sync::OnceLock<()> = std::sync::OnceLock::new();

    let _ = INIT.get_or_init(|| {
        let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// Open the store and embedding backend described by `config`.
pub fn build_environment(config: &AppConfig) -> Result<AppHandles> {
    config.validate().map_err(|err| anyhow!(err))?;

    let store_impl = SledVectorStore::open(&config.vector_index_path)
        .map_err(|err| anyhow!(err))
        .with_context(|| {
            format!(
                "failed to open vector index at {}",
                config.vector_index_path.display()
            )
        })?;
    let store: Arc<dyn VectorStore> = Arc::new(store_impl);
    store
        .ping()
        .map_err(|err| anyhow!(err))
        .context("vector index failed its health check")?;

    let embedder = init_embedder(config).context("failed to initialise embedding backend")?;
    let index = Arc::new(VectorIndex::new(
        embedder,
        Arc::clone(&store),
        IndexConfig::new(
            config.embedding_model_name.clone(),
            config.normalize_embeddings,
        ),
    ));

    Ok(AppHandles {
        config: config.clone(),
        index,
    })
}

fn init_embedder(config: &AppConfig) -> Result<Arc<dyn EmbeddingEngine>> {
    let backend = config.embedding_backend;
    info!(
        backend = backend.id(),
        label = backend.label(),
        model = %config.embedding_model_name,
        device = config.embedding_device.as_str(),
        effective_device = config.embedding_device.effective().as_str(),
        "initialising embedding backend"
    );

    match backend {
        EmbeddingBackend::Simple => {
            let engine = SimpleEmbedEngine::try_new(
                config.embedding_model_name.clone(),
                config.embedding_dimensions,
            )
            .map_err(|err| anyhow!(err))?;
            Ok(Arc::new(engine))
        }
        #[cfg(feature = "fastembed-engine")]
        EmbeddingBackend::FastEmbed => {
            let engine =
                FastEmbedEngine::try_new(&config.embedding_model_name, config.embedding_device)
                    .map_err(|err| anyhow!(err))?;
            Ok(Arc::new(engine))
        }
    }
}

/// `explicit` when given, otherwise `config.json` in the platform data directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let dirs = directories::ProjectDirs::from("kr", "assembly-rag", "AssemblyRag")
        .ok_or_else(|| anyhow!("unable to determine OS data dir"))?;
    Ok(dirs.data_dir().join(CONFIG_FILENAME))
}
