//! Service layer: the build and query pipelines and the seams they run through.

pub mod chunker;
pub mod context_formatter;
pub mod index_builder;
pub mod normalizer;
pub mod prompt;
pub mod query_engine;
pub mod vector_index;

pub use chunker::TextChunker;
pub use context_formatter::{format_context, serialize_context, split_keywords};
pub use index_builder::IndexBuilder;
pub use normalizer::normalize;
pub use prompt::{compose, QUERY_TEMPLATE, REFUSAL};
pub use query_engine::{LanguageModel, QueryConfig, QueryEngine};
pub use vector_index::{EmbeddingEngine, IndexConfig, VectorIndex, VectorStore};
