//! Language model adapter that calls Ollama's `/api/generate` endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::services::LanguageModel;
use crate::domain::DomainError;

use super::{endpoint_url, handle_http_error};

/// Blocking client for a locally served Ollama model.
///
/// Only connection establishment is bounded; generation itself may take as
/// long as the model needs.
pub struct OllamaClient {
    base_url: String,
    model: String,
    agent: ureq::Agent,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .build();

        Self {
            base_url: base_url.into(),
            model: model.into(),
            agent,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        endpoint_url(&self.base_url, "api/generate")
    }

    fn request<'a>(&'a self, prompt: &'a str, context_window: usize) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_ctx: context_window,
            },
        }
    }
}

impl LanguageModel for OllamaClient {
    fn generate(&self, prompt: &str, context_window: usize) -> Result<String, DomainError> {
        let url = self.generate_url();
        debug!(
            url = %url,
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "calling language model"
        );

        let response = self
            .agent
            .post(&url)
            .send_json(self.request(prompt, context_window))
            .map_err(handle_http_error)?;

        let body: GenerateResponse = response.into_json().map_err(|err| {
            DomainError::generation(format!("failed to parse generate response: {err}"))
        })?;

        if let Some(error) = body.error {
            return Err(DomainError::generation(error));
        }

        Ok(body.response)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_ctx: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}
