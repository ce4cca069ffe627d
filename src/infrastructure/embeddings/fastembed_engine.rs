use std::str::FromStr;

use fastembed::{EmbeddingModel, ExecutionProviderDispatch, TextEmbedding, TextInitOptions};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{application::services::EmbeddingEngine, domain::DomainError, settings::Device};

/// Texts handed to the ONNX session per inference call.
const INFERENCE_BATCH: usize = 64;

/// Embedding engine backed by `fastembed`'s `TextEmbedding`.
///
/// The engine keeps a single `TextEmbedding` instance behind a `Mutex`, which
/// allows us to reuse the loaded model without cloning heavyweight resources.
pub struct FastEmbedEngine {
    model_label: String,
    dimensions: usize,
    inner: Mutex<TextEmbedding>,
}

impl FastEmbedEngine {
    /// Create a new engine for the given model (for example `BAAI/bge-m3`).
    pub fn try_new(model_name: impl AsRef<str>, device: Device) -> Result<Self, DomainError> {
        let label = model_name.as_ref().trim();
        if label.is_empty() {
            return Err(DomainError::validation(
                "fastembed model name cannot be empty",
            ));
        }

        let embedding_model = EmbeddingModel::from_str(label).map_err(|err| {
            DomainError::other(format!("failed to parse fastembed model `{label}`: {err}"))
        })?;

        let model_info = TextEmbedding::get_model_info(&embedding_model).map_err(|err| {
            DomainError::other(format!(
                "unable to read metadata for fastembed model `{label}`: {err}"
            ))
        })?;

        let init_options = TextInitOptions::new(embedding_model.clone())
            .with_execution_providers(execution_providers(label, device));
        let text_embedding = TextEmbedding::try_new(init_options).map_err(|err| {
            DomainError::other(format!(
                "failed to initialise fastembed model `{label}`: {err}"
            ))
        })?;

        info!(
            model = label,
            dims = model_info.dim,
            device = device.effective().as_str(),
            "fastembed model loaded"
        );

        Ok(Self {
            model_label: label.to_string(),
            dimensions: model_info.dim,
            inner: Mutex::new(text_embedding),
        })
    }

    fn check_model(&self, model: &str) -> Result<(), DomainError> {
        if model.eq_ignore_ascii_case(&self.model_label) {
            Ok(())
        } else {
            Err(DomainError::embedding(format!(
                "engine initialised for `{}` but `{}` requested",
                self.model_label, model
            )))
        }
    }
}

/// An empty list leaves onnxruntime on its default CPU provider.
fn execution_providers(model: &str, device: Device) -> Vec<ExecutionProviderDispatch> {
    if device != device.effective() {
        warn!(
            model,
            "cuda requested but this build lacks the `cuda` feature; running on cpu"
        );
    }
    match device.effective() {
        Device::Cpu => Vec::new(),
        Device::Cuda => cuda_providers(),
    }
}

#[cfg(feature = "cuda")]
fn cuda_providers() -> Vec<ExecutionProviderDispatch> {
    use ort::execution_providers::CUDAExecutionProvider;

    // ort falls back to the CPU provider when the CUDA runtime cannot be loaded.
    vec![CUDAExecutionProvider::default().build()]
}

#[cfg(not(feature = "cuda"))]
fn cuda_providers() -> Vec<ExecutionProviderDispatch> {
    Vec::new()
}

impl EmbeddingEngine for FastEmbedEngine {
    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_batch(model, &[text])?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::other("fastembed returned no embedding"))
    }

    fn embed_batch(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, DomainError> {
        self.check_model(model)?;

        if texts.iter().any(|text| text.trim().is_empty()) {
            return Err(DomainError::validation("text payload cannot be empty"));
        }

        let mut embedder = self.inner.lock();
        let vectors = embedder
            .embed(texts.to_vec(), Some(INFERENCE_BATCH))
            .map_err(|err| DomainError::other(format!("fastembed inference failed: {err}")))?;

        if let Some(vector) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(DomainError::embedding(format!(
                "unexpected embedding dimension (expected {}, got {})",
                self.dimensions,
                vector.len()
            )));
        }

        Ok(vectors)
    }

    fn dims(&self, _model: &str) -> Option<usize> {
        Some(self.dimensions)
    }
}
