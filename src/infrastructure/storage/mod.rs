//! Storage adapters.
//!
//! This module currently exposes the embedded sled-backed vector store
//! that holds every indexed chunk and answers similarity scans.

pub mod sled_store;

pub use sled_store::SledVectorStore;
