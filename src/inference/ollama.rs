//! Ollama backend: blocking calls to a local `/api/generate` endpoint.
//!
//! The prompt is sent pre-rendered with `raw: true` so Ollama does not wrap
//! it in the model's own chat template.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OllamaConfig;

use super::{Inference, InferenceError, extract_response, render_prompt};

/// Inference over Ollama's HTTP API.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    url: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    raw: bool,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaBackend {
    /// Creates a backend from config.
    ///
    /// Without `timeout-secs` requests wait for as long as the server takes.
    pub fn new(config: &OllamaConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| InferenceError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.url)
    }

    fn request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            raw: true,
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_tokens,
            },
        }
    }
}

impl Inference for OllamaBackend {
    fn generate(&self, instruction: &str, context: &str) -> Result<String, InferenceError> {
        let prompt = render_prompt(instruction, context);
        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "requesting completion from ollama"
        );

        let response = self
            .client
            .post(self.endpoint())
            .json(&self.request(&prompt))
            .send()
            .map_err(|e| InferenceError::Unavailable(format!("{}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(InferenceError::Backend(format!("{status}: {message}")));
        }

        let body: GenerateResponse = response
            .json()
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        extract_response(&body.response)
    }
}
