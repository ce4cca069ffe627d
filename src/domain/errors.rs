use thiserror::Error;

/// Domain-level errors shared across the indexing and query pipelines.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The corpus directory handed to the index builder does not exist.
    #[error("input not found: {0}")]
    InputNotFound(String),

    /// A record file could not be read or decoded into the record schema.
    #[error("document parse error: {0}")]
    DocumentParse(String),

    /// A record decoded fine but lacks a field the pipeline needs.
    #[error("missing field: {0}")]
    MissingField(String),

    /// Writing one batch of entries to the vector store failed.
    #[error("batch commit failed: {0}")]
    BatchCommit(String),

    /// Reading from the vector index at query time failed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The language model call failed or returned an unusable payload.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The incoming request violated an invariant (blank question, bad sizes).
    #[error("validation error: {0}")]
    Validation(String),

    /// Catch-all for storage-related failures we don't want to leak directly.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Embedding backend failure or incompatibility (e.g., dimension mismatch).
    #[error("embedding mismatch: {0}")]
    Embedding(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn input_not_found(msg: impl Into<String>) -> Self {
        Self::InputNotFound(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::DocumentParse(msg.into())
    }

    pub fn missing_field(msg: impl Into<String>) -> Self {
        Self::MissingField(msg.into())
    }

    pub fn batch_commit(msg: impl Into<String>) -> Self {
        Self::BatchCommit(msg.into())
    }

    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
