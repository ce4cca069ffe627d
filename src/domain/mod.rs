//! Domain layer: record schema and the value types that flow through the pipeline.

pub mod errors;
pub mod models;

pub use errors::DomainError;
pub use models::{
    BenchmarkRecord, Chunk, EntryEmbedding, IndexedEntry, Metadata, NormalizedDocument, Record,
    RetrievedChunk, METADATA_KEYS,
};
