use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::application::dtos::QueryOutcome;
use crate::domain::{BenchmarkRecord, DomainError, RetrievedChunk};

use super::context_formatter::{format_context, serialize_context};
use super::prompt::compose;
use super::vector_index::VectorIndex;

const SEPARATOR_WIDTH: usize = 50;

/// Text generation backend answering a fully composed prompt.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str, context_window: usize) -> Result<String, DomainError>;
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub retriever_k: usize,
    pub min_relevance: Option<f32>,
    pub llm_context_window: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retriever_k: 2,
            min_relevance: None,
            llm_context_window: 10_000,
        }
    }
}

/// Retrieve, format, compose, generate.
pub struct QueryEngine {
    index: Arc<VectorIndex>,
    model: Arc<dyn LanguageModel>,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(index: Arc<VectorIndex>, model: Arc<dyn LanguageModel>, config: QueryConfig) -> Self {
        Self {
            index,
            model,
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Answer `question` from the indexed minutes, returning the model output as-is.
    pub fn query(&self, question: &str) -> Result<String, DomainError> {
        self.query_detailed(question).map(|outcome| outcome.answer)
    }

    pub fn query_detailed(&self, question: &str) -> Result<QueryOutcome, DomainError> {
        if question.trim().is_empty() {
            return Err(DomainError::validation("question cannot be empty"));
        }

        let results = self.index.retrieve(question, self.config.retriever_k)?;
        let results = self.apply_threshold(results);
        debug!(hits = results.len(), "retrieved context");

        let context = format_context(&results);
        let data = serialize_context(&context)?;
        let prompt = compose(&data, question);

        let answer = self
            .model
            .generate(&prompt, self.config.llm_context_window)
            .map_err(|err| match err {
                DomainError::Generation(_) => err,
                other => DomainError::generation(other.to_string()),
            })?;

        Ok(QueryOutcome {
            question: question.to_string(),
            context,
            prompt,
            answer,
        })
    }

    /// Run every question in order, echoing to stdout, then overwrite `output_path`.
    pub fn benchmark(
        &self,
        questions: &[String],
        output_path: impl AsRef<Path>,
    ) -> Result<Vec<BenchmarkRecord>, DomainError> {
        let stdout = io::stdout();
        let mut echo = stdout.lock();
        self.benchmark_to(questions, output_path, &mut echo)
    }

    /// Same as [`benchmark`](Self::benchmark) with the echo sent to `echo`.
    ///
    /// The first failed question aborts the run; the artifact is only written
    /// once every question has been answered.
    pub fn benchmark_to<W: Write>(
        &self,
        questions: &[String],
        output_path: impl AsRef<Path>,
        echo: &mut W,
    ) -> Result<Vec<BenchmarkRecord>, DomainError> {
        let output_path = output_path.as_ref();
        let separator = "-".repeat(SEPARATOR_WIDTH);
        let mut records = Vec::with_capacity(questions.len());

        for (position, question) in questions.iter().enumerate() {
            info!(
                question = position + 1,
                total = questions.len(),
                "running benchmark query"
            );
            let answer = self.query(question)?;

            write_echo(echo, question, &answer, &separator)?;
            records.push(BenchmarkRecord {
                question: question.clone(),
                answer,
            });
        }

        let artifact: String = records
            .iter()
            .map(|record| {
                format!(
                    "Query: {}\nAnswer: {}\n{separator}\n",
                    record.question, record.answer
                )
            })
            .collect();
        fs::write(output_path, artifact).map_err(|err| {
            DomainError::other(format!(
                "failed to write benchmark results to {}: {err}",
                output_path.display()
            ))
        })?;

        info!(
            records = records.len(),
            path = %output_path.display(),
            "benchmark complete"
        );
        Ok(records)
    }

    fn apply_threshold(&self, results: Vec<RetrievedChunk>) -> Vec<RetrievedChunk> {
        let Some(threshold) = self.config.min_relevance else {
            return results;
        };
        let before = results.len();
        let kept: Vec<RetrievedChunk> = results
            .into_iter()
            .filter(|result| result.score >= threshold)
            .collect();
        if kept.len() < before {
            debug!(
                dropped = before - kept.len(),
                threshold,
                "dropped low relevance results"
            );
        }
        kept
    }
}

fn write_echo<W: Write>(
    echo: &mut W,
    question: &str,
    answer: &str,
    separator: &str,
) -> Result<(), DomainError> {
    writeln!(echo, "Query: {question}\n---Answer---\n{answer}\n{separator}\n")
        .and_then(|_| echo.flush())
        .map_err(|err| DomainError::other(format!("failed to echo benchmark result: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::vector_index::{IndexConfig, VectorStore};
    use crate::domain::{Chunk, IndexedEntry, Metadata};
    use crate::infrastructure::{SimpleEmbedEngine, SledVectorStore};
    use parking_lot::Mutex;

    const MODEL: &str = "test/hash";

    /// Records every prompt and answers with a canned reply.
    struct CannedModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl LanguageModel for CannedModel {
        fn generate(&self, prompt: &str, context_window: usize) -> Result<String, DomainError> {
            assert_eq!(context_window, 10_000);
            self.prompts.lock().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    /// Fails when the question asks about `poison`.
    struct TrippedModel;

    impl LanguageModel for TrippedModel {
        fn generate(&self, prompt: &str, _context_window: usize) -> Result<String, DomainError> {
            if prompt.trim_end().ends_with("poison gas") {
                Err(DomainError::generation("model crashed"))
            } else {
                Ok("fine".to_string())
            }
        }
    }

    struct BrokenStore;

    impl VectorStore for BrokenStore {
        fn upsert(&self, _entries: &[IndexedEntry]) -> Result<(), DomainError> {
            Ok(())
        }

        fn search(
            &self,
            _vector: &[f32],
            _limit: usize,
        ) -> Result<Vec<(IndexedEntry, f32)>, DomainError> {
            Err(DomainError::storage("index unreadable"))
        }

        fn count(&self) -> Result<usize, DomainError> {
            Ok(0)
        }

        fn clear(&self) -> Result<(), DomainError> {
            Ok(())
        }

        fn ping(&self) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn chunk(text: &str, agenda: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            metadata: Metadata::from([("agenda".to_string(), agenda.to_string())]),
            index: 0,
            start: 0,
            end: text.chars().count(),
        }
    }

    fn index(dir: &Path) -> Arc<VectorIndex> {
        let embedder = Arc::new(SimpleEmbedEngine::try_new(MODEL, 512).unwrap());
        let store = Arc::new(SledVectorStore::open(dir).unwrap());
        let index = VectorIndex::new(embedder, store, IndexConfig::new(MODEL, true));
        index
            .upsert(&[
                chunk("flood relief budget for river towns", "flood"),
                chunk("semiconductor export tariff schedule", "chips"),
                chunk("poison gas storage rules", "chemicals"),
            ])
            .unwrap();
        Arc::new(index)
    }

    #[test]
    fn prompt_carries_question_and_ranked_context() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(CannedModel::new("answer"));
        let engine = QueryEngine::new(index(dir.path()), model.clone(), QueryConfig::default());

        let outcome = engine.query_detailed("flood relief budget").unwrap();

        assert_eq!(outcome.answer, "answer");
        assert_eq!(outcome.context.len(), 2);
        assert_eq!(outcome.context[0].meeting.agenda, "flood");
        assert!(outcome.prompt.contains("flood relief budget for river towns"));
        assert!(outcome.prompt.ends_with("---질문---\nflood relief budget\n"));
        assert_eq!(model.prompts.lock().len(), 1);
    }

    #[test]
    fn threshold_can_empty_the_context() {
        let dir = tempfile::tempdir().unwrap();
        let config = QueryConfig {
            min_relevance: Some(1.01),
            ..QueryConfig::default()
        };
        let engine = QueryEngine::new(index(dir.path()), Arc::new(CannedModel::new("x")), config);

        let outcome = engine.query_detailed("flood relief budget").unwrap();
        assert!(outcome.context.is_empty());
        assert!(outcome.prompt.contains("---데이터---\n[]\n"));
    }

    #[test]
    fn blank_question_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let engine = QueryEngine::new(
            index(dir.path()),
            Arc::new(CannedModel::new("x")),
            QueryConfig::default(),
        );
        assert!(matches!(engine.query(" \n"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn store_failure_surfaces_as_retrieval_error() {
        let embedder = Arc::new(SimpleEmbedEngine::try_new(MODEL, 64).unwrap());
        let index = VectorIndex::new(embedder, Arc::new(BrokenStore), IndexConfig::new(MODEL, true));
        let engine = QueryEngine::new(
            Arc::new(index),
            Arc::new(CannedModel::new("x")),
            QueryConfig::default(),
        );
        assert!(matches!(
            engine.query("anything"),
            Err(DomainError::Retrieval(_))
        ));
    }

    #[test]
    fn benchmark_echoes_and_writes_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("bench.txt");
        let engine = QueryEngine::new(
            index(&dir.path().join("db")),
            Arc::new(CannedModel::new("canned")),
            QueryConfig::default(),
        );
        let questions = vec!["first flood".to_string(), "second tariff".to_string()];
        let mut echo = Vec::new();

        let records = engine.benchmark_to(&questions, &output, &mut echo).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].question, "second tariff");
        let dashes = "-".repeat(50);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            format!(
                "Query: first flood\nAnswer: canned\n{dashes}\nQuery: second tariff\nAnswer: canned\n{dashes}\n"
            )
        );
        let echoed = String::from_utf8(echo).unwrap();
        assert!(echoed.starts_with(&format!("Query: first flood\n---Answer---\ncanned\n{dashes}\n\n")));
    }

    #[test]
    fn failed_question_aborts_without_touching_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("bench.txt");
        fs::write(&output, "previous run").unwrap();
        let engine = QueryEngine::new(
            index(&dir.path().join("db")),
            Arc::new(TrippedModel),
            QueryConfig::default(),
        );
        let questions = vec!["flood relief".to_string(), "poison gas".to_string()];

        let result = engine.benchmark_to(&questions, &output, &mut io::sink());

        assert!(matches!(result, Err(DomainError::Generation(_))));
        assert_eq!(fs::read_to_string(&output).unwrap(), "previous run");
    }
}
