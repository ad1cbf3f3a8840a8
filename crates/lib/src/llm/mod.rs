//! Completion backend abstraction and the OpenAI-compatible client.
//!
//! One prompt in, one trimmed completion out. No conversation state is kept between calls.

mod openai;

pub use openai::{CompletionChoice, CompletionRequest, CompletionResponse, OpenAiClient};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {0}")]
    Api(String),
    #[error("completion returned no usable text")]
    Empty,
}

/// Text-generation backend: sends a single user utterance, returns the generated text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue one completion call for `prompt`. No retry; any failure is returned to the caller.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
