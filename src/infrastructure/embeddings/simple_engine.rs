use ahash::RandomState;

use crate::{application::services::EmbeddingEngine, domain::DomainError};

/// A lightweight, deterministic embedding engine that hashes tokens into a fixed-size vector.
/// Lexical overlap drives similarity, which is enough to exercise the pipeline offline
/// without downloading models or shipping native dependencies.
///
/// Token buckets come from a fixed-seed hasher, so vectors written by one
/// process compare correctly with query vectors computed by another.
pub struct SimpleEmbedEngine {
    model_name: String,
    dimensions: usize,
    hasher: RandomState,
}

const TOKEN_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

impl SimpleEmbedEngine {
    pub fn try_new(model_name: impl Into<String>, dimensions: usize) -> Result<Self, DomainError> {
        if dimensions == 0 {
            return Err(DomainError::validation(
                "embedding dimensions must be greater than zero",
            ));
        }
        let dims = dimensions.clamp(8, 4096);
        Ok(Self {
            model_name: model_name.into(),
            dimensions: dims,
            hasher: RandomState::with_seeds(
                TOKEN_SEEDS[0],
                TOKEN_SEEDS[1],
                TOKEN_SEEDS[2],
                TOKEN_SEEDS[3],
            ),
        })
    }

    /// Lowercased runs of alphanumeric characters; Hangul counts as alphanumeric.
    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
    }

    fn hash_token(&self, token: &str) -> usize {
        self.hasher.hash_one(token) as usize
    }

    fn embed_internal(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in Self::tokenize(text) {
            let idx = self.hash_token(&token) % self.dimensions;
            vector[idx] += 1.0;
        }

        // L2 normalize to keep scores in [-1, 1]
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

impl EmbeddingEngine for SimpleEmbedEngine {
    fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, DomainError> {
        if !model.eq_ignore_ascii_case(&self.model_name) {
            return Err(DomainError::embedding(format!(
                "engine initialised for `{}` but `{}` requested",
                self.model_name, model
            )));
        }
        if text.trim().is_empty() {
            return Err(DomainError::validation("text payload cannot be empty"));
        }
        Ok(self.embed_internal(text))
    }

    fn dims(&self, _model: &str) -> Option<usize> {
        Some(self.dimensions)
    }
}
