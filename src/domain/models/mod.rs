use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod record;

pub use record::{ContextSummary, Record, Utterance};

/// Flat string metadata carried by every document, chunk and stored entry.
pub type Metadata = BTreeMap<String, String>;

/// The flat metadata keys every normalized document carries, in record order.
pub const METADATA_KEYS: [&str; 16] = [
    "date",
    "meeting_name",
    "committee_name",
    "meeting_number",
    "session_number",
    "agenda",
    "law",
    "questioner_name",
    "questioner_position",
    "question_comment",
    "question_keyword",
    "answerer_name",
    "answerer_affiliation",
    "answerer_position",
    "answer_comment",
    "answer_keyword",
];

/// Text and flat metadata derived 1:1 from a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub content: String,
    pub metadata: Metadata,
}

/// Contiguous span of a document's content used as the embedding unit.
///
/// `start` and `end` are character offsets into the parent content, so the
/// overlap with the previous chunk of the same document is `prev.end - start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: Metadata,
    /// Position of the chunk within its parent document.
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Core record persisted by the vector store: one chunk with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub id: Uuid,
    pub text: String,
    pub metadata: Metadata,
    pub embedding: EntryEmbedding,
    pub indexed_at: DateTime<Utc>,
}

impl IndexedEntry {
    pub fn new(text: impl Into<String>, metadata: Metadata, embedding: EntryEmbedding) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            metadata,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// Vector representation of a stored chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryEmbedding {
    pub model: String,
    pub vector: Vec<f32>,
}

impl EntryEmbedding {
    pub fn new(model: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            model: model.into(),
            vector,
        }
    }
}

/// One retrieval hit, ordered by descending `score` within a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub entry_id: Uuid,
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

impl From<(IndexedEntry, f32)> for RetrievedChunk {
    fn from((entry, score): (IndexedEntry, f32)) -> Self {
        Self {
            entry_id: entry.id,
            text: entry.text,
            metadata: entry.metadata,
            score,
        }
    }
}

/// Question/answer pair accumulated by a benchmark run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub question: String,
    pub answer: String,
}
