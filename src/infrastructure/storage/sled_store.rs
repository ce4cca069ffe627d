use std::path::{Path, PathBuf};

use bincode::Options;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use sled::{Batch, Config, Db, IVec, Tree};
use tracing::debug;

use crate::{
    application::services::VectorStore,
    domain::{DomainError, IndexedEntry},
};

const ENTRIES_TREE: &str = "entries";

/// Embedded vector store backed by `sled`.
///
/// Entries live in a single tree keyed by a monotonic id, so iteration order
/// is insertion order and re-running a build appends rather than replaces.
/// Similarity is a brute-force cosine scan in memory.
pub struct SledVectorStore {
    db: Db,
    entries: Tree,
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SledVectorStore {
    /// Opens (or creates) a sled database rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|err| {
            DomainError::storage(format!("failed to create index directory {:?}: {err}", dir))
        })?;

        let db = Config::default()
            .path(&dir)
            .cache_capacity(64 * 1024 * 1024)
            .mode(sled::Mode::HighThroughput)
            .open()
            .map_err(|err| DomainError::storage(format!("failed to open sled db: {err}")))?;

        let entries = db
            .open_tree(ENTRIES_TREE)
            .map_err(|err| DomainError::storage(format!("failed to open entries tree: {err}")))?;

        Ok(Self {
            db,
            entries,
            data_dir: dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .serialize(value)
            .map_err(|err| DomainError::storage(format!("serialization error: {err}")))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)
            .map_err(|err| DomainError::storage(format!("deserialization error: {err}")))
    }

    fn next_key(&self) -> Result<[u8; 8], DomainError> {
        self.db
            .generate_id()
            .map(u64::to_be_bytes)
            .map_err(|err| DomainError::storage(format!("failed to allocate entry id: {err}")))
    }

    fn decode_entry(bytes: &IVec) -> Result<IndexedEntry, DomainError> {
        Self::deserialize(bytes.as_ref())
    }

    fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, DomainError> {
        if query.len() != candidate.len() {
            return Err(DomainError::embedding(format!(
                "embedding dimension mismatch: query {} vs candidate {}",
                query.len(),
                candidate.len()
            )));
        }

        let mut dot = 0.0f32;
        let mut q_norm = 0.0f32;
        let mut c_norm = 0.0f32;

        for (q, c) in query.iter().zip(candidate.iter()) {
            dot += q * c;
            q_norm += q * q;
            c_norm += c * c;
        }

        let denom = q_norm.sqrt() * c_norm.sqrt();
        if denom == 0.0 {
            return Ok(0.0);
        }

        Ok((dot / denom).clamp(-1.0, 1.0))
    }
}

impl VectorStore for SledVectorStore {
    fn upsert(&self, entries: &[IndexedEntry]) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        let mut batch = Batch::default();
        for entry in entries {
            batch.insert(self.next_key()?.to_vec(), Self::serialize(entry)?);
        }

        self.entries
            .apply_batch(batch)
            .map_err(|err| DomainError::storage(format!("failed to persist entries: {err}")))?;

        self.entries
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush entries: {err}")))?;

        debug!(count = entries.len(), "entries committed");
        Ok(())
    }

    fn search(
        &self,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<(IndexedEntry, f32)>, DomainError> {
        let mut scored: Vec<(IndexedEntry, f32)> = Vec::new();

        for item in self.entries.iter() {
            let (_, value) = item.map_err(|err| {
                DomainError::storage(format!("failed to read index entry: {err}"))
            })?;
            let entry = Self::decode_entry(&value)?;
            let score = Self::cosine_similarity(vector, &entry.embedding.vector)?;
            scored.push((entry, score));
        }

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored)
    }

    fn count(&self) -> Result<usize, DomainError> {
        Ok(self.entries.len())
    }

    fn clear(&self) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock();

        self.entries
            .clear()
            .map_err(|err| DomainError::storage(format!("failed to clear entries: {err}")))?;
        self.entries
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush entries: {err}")))?;

        Ok(())
    }

    fn ping(&self) -> Result<(), DomainError> {
        self.db
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush db: {err}")))?;

        Ok(())
    }
}
