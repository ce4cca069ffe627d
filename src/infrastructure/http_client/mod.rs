//! HTTP adapters for collaborators reached over the network.
//!
//! The only one today is the Ollama generation endpoint that serves the
//! answering language model.

mod ollama;

pub use ollama::OllamaClient;

use serde::Deserialize;

use crate::domain::DomainError;

/// Default Ollama endpoint
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

/// Join `base_url` and `path` without doubling or dropping the slash.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Error body returned by Ollama on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert HTTP errors into generation failures
pub fn handle_http_error(error: ureq::Error) -> DomainError {
    match error {
        ureq::Error::Status(code, response) => {
            if let Ok(err_response) = response.into_json::<ErrorResponse>() {
                DomainError::generation(format!("HTTP {} - {}", code, err_response.error))
            } else {
                DomainError::generation(format!("HTTP error: {}", code))
            }
        }
        ureq::Error::Transport(transport) => {
            DomainError::generation(format!("Transport error: {}", transport))
        }
    }
}
