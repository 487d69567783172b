//! Inference capability: instruction plus context in, generated text out.
//!
//! The mission loop only ever sees [`Inference`]. Backends render the pair
//! through the instruction-tuning template the model was trained on, run the
//! completion, and hand back the text after the final `### Response:` marker.

mod command;
mod ollama;

use crate::config::InferenceConfig;

pub use command::CommandBackend;
pub use ollama::OllamaBackend;

/// Opening line of the prompt template shared by every backend.
const PROMPT_PREAMBLE: &str = "Below is an instruction that describes a task, paired with an input that provides further context. Write a response that appropriately completes the request.";

const RESPONSE_MARKER: &str = "### Response:";

/// Errors surfaced by an inference backend.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The backend could not be reached or started.
    #[error("inference backend unavailable: {0}")]
    Unavailable(String),

    /// The backend ran but reported failure.
    #[error("inference backend failed: {0}")]
    Backend(String),

    /// The backend answered with something that could not be decoded.
    #[error("malformed inference response: {0}")]
    Malformed(String),

    /// The completion was blank after post-processing.
    #[error("inference backend returned an empty response")]
    Empty,
}

/// Something that turns an instruction and its context into text.
///
/// Calls block until the backend answers.
pub trait Inference {
    fn generate(&self, instruction: &str, context: &str) -> Result<String, InferenceError>;
}

impl<I: Inference + ?Sized> Inference for Box<I> {
    fn generate(&self, instruction: &str, context: &str) -> Result<String, InferenceError> {
        (**self).generate(instruction, context)
    }
}

/// Builds the backend described by `config`.
pub fn from_config(config: &InferenceConfig) -> Result<Box<dyn Inference>, InferenceError> {
    Ok(match config {
        InferenceConfig::Ollama(ollama) => Box::new(OllamaBackend::new(ollama)?),
        InferenceConfig::Command(command) => Box::new(CommandBackend::new(command)),
    })
}

/// Renders an instruction and context through the prompt template.
pub fn render_prompt(instruction: &str, context: &str) -> String {
    format!(
        "{PROMPT_PREAMBLE}\n\n### Instruction:\n{instruction}\n\n### Input:\n{context}\n\n{RESPONSE_MARKER}\n"
    )
}

/// Extracts the completion from raw model output.
///
/// Takes the text after the last `### Response:` marker (the whole output
/// when there is none) and trims it. Blank completions are an error.
pub fn extract_response(raw: &str) -> Result<String, InferenceError> {
    let tail = raw.rsplit(RESPONSE_MARKER).next().unwrap_or(raw);
    let text = tail.trim();
    if text.is_empty() {
        return Err(InferenceError::Empty);
    }
    Ok(text.to_string())
}
