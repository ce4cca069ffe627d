use std::sync::Arc;

use tracing::debug;

use crate::domain::{Chunk, DomainError, EntryEmbedding, IndexedEntry, RetrievedChunk};

/// Abstraction over any embedding engine (FastEmbed, hash embedder, test doubles).
pub trait EmbeddingEngine: Send + Sync {
    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, DomainError>;

    fn embed_batch(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        texts.iter().map(|text| self.embed(model, text)).collect()
    }

    fn dims(&self, _model: &str) -> Option<usize> {
        None
    }
}

/// Contract for the persistent entry store backing the index.
pub trait VectorStore: Send + Sync {
    /// Append all entries as one unit; either every entry lands or none does.
    fn upsert(&self, entries: &[IndexedEntry]) -> Result<(), DomainError>;

    fn search(&self, vector: &[f32], limit: usize)
        -> Result<Vec<(IndexedEntry, f32)>, DomainError>;

    fn count(&self) -> Result<usize, DomainError>;

    fn clear(&self) -> Result<(), DomainError>;

    fn ping(&self) -> Result<(), DomainError>;
}

/// Settings shared by the index and its adapters.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub embedding_model: String,
    pub normalize_embeddings: bool,
}

impl IndexConfig {
    pub fn new(embedding_model: impl Into<String>, normalize_embeddings: bool) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            normalize_embeddings,
        }
    }
}

/// Text-level view of the store: embeds on the way in and on the way out.
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingEngine>,
    store: Arc<dyn VectorStore>,
    config: IndexConfig,
}

impl VectorIndex {
    pub fn new(
        embedder: Arc<dyn EmbeddingEngine>,
        store: Arc<dyn VectorStore>,
        config: IndexConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    pub fn embedding_model(&self) -> &str {
        &self.config.embedding_model
    }

    pub fn embedding_dimensions(&self) -> Option<usize> {
        self.embedder.dims(&self.config.embedding_model)
    }

    /// Embed and commit one batch of chunks, returning how many entries landed.
    ///
    /// Whitespace-only chunks carry nothing to embed and are skipped. Any
    /// embedding or storage failure is reported as [`DomainError::BatchCommit`].
    pub fn upsert(&self, chunks: &[Chunk]) -> Result<usize, DomainError> {
        let indexable: Vec<&Chunk> = chunks
            .iter()
            .filter(|chunk| !chunk.text.trim().is_empty())
            .collect();
        if indexable.len() < chunks.len() {
            debug!(
                skipped = chunks.len() - indexable.len(),
                "skipping blank chunks"
            );
        }
        if indexable.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = indexable.iter().map(|chunk| chunk.text.as_str()).collect();
        let vectors = self
            .embedder
            .embed_batch(&self.config.embedding_model, &texts)
            .map_err(|err| DomainError::batch_commit(err.to_string()))?;
        if vectors.len() != indexable.len() {
            return Err(DomainError::batch_commit(format!(
                "embedding engine returned {} vectors for {} chunks",
                vectors.len(),
                indexable.len()
            )));
        }

        let entries: Vec<IndexedEntry> = indexable
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let vector = self.prepare(vector);
                IndexedEntry::new(
                    chunk.text.clone(),
                    chunk.metadata.clone(),
                    EntryEmbedding::new(&self.config.embedding_model, vector),
                )
            })
            .collect();

        self.store
            .upsert(&entries)
            .map_err(|err| DomainError::batch_commit(err.to_string()))?;

        Ok(entries.len())
    }

    /// Top-`k` chunks for `query`, best match first.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::validation("query cannot be empty"));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self
            .embedder
            .embed(&self.config.embedding_model, query)
            .map_err(|err| DomainError::retrieval(err.to_string()))?;
        let vector = self.prepare(vector);

        let matches = self
            .store
            .search(&vector, k)
            .map_err(|err| DomainError::retrieval(err.to_string()))?;

        Ok(matches.into_iter().map(RetrievedChunk::from).collect())
    }

    pub fn len(&self) -> Result<usize, DomainError> {
        self.store.count()
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<(), DomainError> {
        self.store.clear()
    }

    fn prepare(&self, mut vector: Vec<f32>) -> Vec<f32> {
        if self.config.normalize_embeddings {
            l2_normalize(&mut vector);
        }
        vector
    }
}

/// Scale `vector` to unit length in place; zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metadata;
    use crate::infrastructure::{SimpleEmbedEngine, SledVectorStore};

    const MODEL: &str = "test/hash";

    struct FailingStore;

    impl VectorStore for FailingStore {
        fn upsert(&self, _entries: &[IndexedEntry]) -> Result<(), DomainError> {
            Err(DomainError::storage("disk full"))
        }

        fn search(
            &self,
            _vector: &[f32],
            _limit: usize,
        ) -> Result<Vec<(IndexedEntry, f32)>, DomainError> {
            Err(DomainError::storage("tree unreadable"))
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

    fn embedder() -> Arc<dyn EmbeddingEngine> {
        Arc::new(SimpleEmbedEngine::try_new(MODEL, 512).unwrap())
    }

    #[test]
    fn l2_normalize_produces_unit_vectors() {
        let mut vector = vec![3.0, 4.0];
        l2_normalize(&mut vector);
        assert!((vector[0] - 0.6).abs() < 1e-6);
        assert!((vector[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0; 3];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0; 3]);
    }

    #[test]
    fn upsert_then_retrieve_ranks_best_match_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SledVectorStore::open(dir.path()).unwrap());
        let index = VectorIndex::new(embedder(), store, IndexConfig::new(MODEL, true));

        let stored = index
            .upsert(&[
                chunk("flood relief budget for river towns", "flood"),
                chunk("semiconductor export tariff schedule", "chips"),
                chunk("   ", "blank"),
            ])
            .unwrap();
        assert_eq!(stored, 2);
        assert_eq!(index.len().unwrap(), 2);

        let hits = index.retrieve("flood relief budget", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].metadata["agenda"], "flood");
        assert!(hits[0].score >= hits[1].score);

        assert!(index.retrieve("anything", 0).unwrap().is_empty());
        assert!(matches!(
            index.retrieve("  ", 2),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn store_failures_map_to_pipeline_errors() {
        let index = VectorIndex::new(
            embedder(),
            Arc::new(FailingStore),
            IndexConfig::new(MODEL, true),
        );

        assert!(matches!(
            index.upsert(&[chunk("some text", "a")]),
            Err(DomainError::BatchCommit(_))
        ));
        assert!(matches!(
            index.retrieve("some text", 2),
            Err(DomainError::Retrieval(_))
        ));
    }

    #[test]
    fn model_mismatch_is_a_batch_commit_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SledVectorStore::open(dir.path()).unwrap());
        let index = VectorIndex::new(embedder(), store, IndexConfig::new("other/model", true));

        assert!(matches!(
            index.upsert(&[chunk("some text", "a")]),
            Err(DomainError::BatchCommit(_))
        ));
    }
}
