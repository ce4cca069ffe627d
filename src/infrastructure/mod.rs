//! Infrastructure layer wiring concrete adapters (embeddings, storage, language model).

pub mod embeddings;
pub mod http_client;
pub mod storage;

#[cfg(feature = "fastembed-engine")]
pub use embeddings::FastEmbedEngine;
pub use embeddings::SimpleEmbedEngine;
pub use http_client::OllamaClient;
pub use storage::SledVectorStore;
