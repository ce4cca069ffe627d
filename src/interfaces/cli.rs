use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::services::serialize_context;
use crate::settings::{AppConfig, Device, EmbeddingBackend};
use crate::{build_environment, resolve_config_path};

/// Asked when `benchmark` is given no questions.
const DEFAULT_BENCHMARK_QUESTION: &str =
    "태풍피해에 대한 국가적인 대비책은 어떻게 마련되어야 할까요?";

#[derive(Parser, Debug)]
#[command(
    name = "assembly-rag",
    about = "Index National Assembly meeting records and answer questions grounded in them"
)]
pub struct Cli {
    /// Configuration file (defaults to config.json in the platform data dir)
    #[arg(long, global = true, env = "ASSEMBLY_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Vector index directory
    #[arg(long, global = true)]
    index_path: Option<PathBuf>,

    /// Embedding backend id (simple, or fastembed when compiled in)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Embedding model name
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    /// Embedding device (cpu or cuda)
    #[arg(long, global = true)]
    device: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk and index every *.json record in a directory
    Build {
        input: PathBuf,

        /// Clear the index before building
        #[arg(long, default_value_t = false)]
        fresh: bool,

        #[arg(long)]
        chunk_size: Option<usize>,

        #[arg(long)]
        chunk_overlap: Option<usize>,

        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Answer one question from the index
    Query {
        question: String,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        /// Print the retrieved context blocks before the answer
        #[arg(long, default_value_t = false)]
        show_context: bool,
    },
    /// Answer questions in order and write the results file
    Benchmark {
        /// Questions to ask; falls back to a built-in sample
        questions: Vec<String>,

        /// File with one question per line
        #[arg(long)]
        questions_file: Option<PathBuf>,

        /// Results file, overwritten on success
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        retrieval: RetrievalArgs,
    },
    /// Write the effective configuration as JSON
    InitConfig {
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
struct RetrievalArgs {
    /// Number of chunks handed to the model
    #[arg(long)]
    k: Option<usize>,

    /// Drop chunks scoring below this cosine similarity
    #[arg(long)]
    min_relevance: Option<f32>,

    /// Ollama model name
    #[arg(long)]
    llm_model: Option<String>,

    /// Ollama base URL
    #[arg(long)]
    llm_url: Option<String>,
}

/// Parse arguments from the process and dispatch.
pub fn run() -> Result<()> {
    execute(Cli::parse())
}

pub fn execute(cli: Cli) -> Result<()> {
    let config_path = resolve_config_path(cli.config.clone())?;
    let mut config = AppConfig::load(&config_path)
        .map_err(|err| anyhow!(err))
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    cli.apply_overrides(&mut config)?;
    config.validate().map_err(|err| anyhow!(err))?;

    match cli.command {
        Command::InitConfig { force } => {
            if config_path.exists() && !force {
                bail!(
                    "{} already exists; pass --force to overwrite",
                    config_path.display()
                );
            }
            config.persist(&config_path).map_err(|err| anyhow!(err))?;
            println!("{}", config_path.display());
        }
        Command::Build { input, fresh, .. } => {
            let handles = build_environment(&config)?;
            let builder = handles.index_builder()?;
            if fresh {
                builder.clear().map_err(|err| anyhow!(err))?;
            }
            let report = builder.build(&input).map_err(|err| anyhow!(err))?;
            println!(
                "files: {}, documents: {}, failed files: {}, chunks indexed: {}/{}, failed batches: {}",
                report.files_seen,
                report.documents_processed,
                report.failed_files.len(),
                report.chunks_indexed,
                report.chunks_total,
                report.failed_batches.len()
            );
        }
        Command::Query {
            question,
            show_context,
            ..
        } => {
            let handles = build_environment(&config)?;
            let engine = handles.query_engine();
            let outcome = engine
                .query_detailed(&question)
                .map_err(|err| anyhow!(err))?;
            if show_context {
                let context = serialize_context(&outcome.context).map_err(|err| anyhow!(err))?;
                println!("--- Retrieved Context ---\n{context}\n");
            }
            println!("{}", outcome.answer);
        }
        Command::Benchmark {
            questions,
            questions_file,
            output,
            ..
        } => {
            let questions = collect_questions(questions, questions_file)?;
            let output = output.unwrap_or_else(|| config.benchmark_output.clone());
            let handles = build_environment(&config)?;
            let records = handles
                .query_engine()
                .benchmark(&questions, &output)
                .map_err(|err| anyhow!(err))?;
            info!(
                records = records.len(),
                path = %output.display(),
                "benchmark results saved"
            );
        }
    }

    Ok(())
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(path) = &self.index_path {
            config.vector_index_path = path.clone();
        }
        if let Some(id) = &self.backend {
            let backend = EmbeddingBackend::from_id(id)
                .ok_or_else(|| anyhow!("unknown embedding backend '{id}'"))?;
            if backend != config.embedding_backend {
                config.embedding_backend = backend;
                config.embedding_model_name = backend.default_model().to_string();
            }
        }
        if let Some(model) = &self.embedding_model {
            config.embedding_model_name = model.clone();
        }
        if let Some(device) = &self.device {
            config.embedding_device = parse_device(device)?;
        }

        match &self.command {
            Command::Build {
                chunk_size,
                chunk_overlap,
                batch_size,
                ..
            } => {
                if let Some(value) = chunk_size {
                    config.chunk_size = *value;
                }
                if let Some(value) = chunk_overlap {
                    config.chunk_overlap = *value;
                }
                if let Some(value) = batch_size {
                    config.batch_size = *value;
                }
            }
            Command::Query { retrieval, .. } | Command::Benchmark { retrieval, .. } => {
                retrieval.apply(config);
            }
            Command::InitConfig { .. } => {}
        }
        Ok(())
    }
}

impl RetrievalArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(k) = self.k {
            config.retriever_k = k;
        }
        if self.min_relevance.is_some() {
            config.min_relevance = self.min_relevance;
        }
        if let Some(model) = &self.llm_model {
            config.llm_model = model.clone();
        }
        if let Some(url) = &self.llm_url {
            config.llm_base_url = url.clone();
        }
    }
}

fn parse_device(raw: &str) -> Result<Device> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cpu" => Ok(Device::Cpu),
        "cuda" | "gpu" => Ok(Device::Cuda),
        other => bail!("unknown device '{other}', expected cpu or cuda"),
    }
}

fn collect_questions(mut questions: Vec<String>, file: Option<PathBuf>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        questions.extend(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    if questions.is_empty() {
        questions.push(DEFAULT_BENCHMARK_QUESTION.to_string());
    }
    Ok(questions)
}
