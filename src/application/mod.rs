//! Application layer wiring DTOs and services for the minutes pipeline.

pub mod dtos;
pub mod services;

pub use dtos::{BuildReport, ContextBlock, FileFailure, QueryOutcome};
pub use services::{IndexBuilder, QueryEngine, VectorIndex};
