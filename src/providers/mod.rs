mod openai;

#[cfg(test)]
mod tests;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

use crate::core::config::AppConfig;
use crate::core::error::{ServiceError, TransportError};
use crate::core::model::Model;
use crate::core::session::UsageRecord;

/// One element of the remote completion: an ordered text fragment, the
/// terminal usage record, or a failure. Usage only ever follows the last
/// fragment; the sequence is finite and cannot be restarted.
#[derive(Debug, Clone)]
pub enum CompletionEvent {
    Delta { text: String },
    Complete { usage: UsageRecord },
    Error { error: CompletionError },
}

#[derive(Error, Debug, Clone)]
pub enum CompletionError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<CompletionError> for crate::core::error::AnalysisError {
    fn from(e: CompletionError) -> Self {
        match e {
            CompletionError::Service(e) => Self::Service(e),
            CompletionError::Transport(e) => Self::Transport(e),
        }
    }
}

pub type CompletionStream = Pin<Box<dyn futures_core::Stream<Item = CompletionEvent> + Send>>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Issues one deterministic (temperature zero) completion request and
    /// returns the incremental response stream. No retry on any failure.
    async fn stream_completion(&self, prompt: &str) -> Result<CompletionStream, CompletionError>;

    fn model(&self) -> &Model;
}

pub fn create_provider(
    config: &AppConfig,
    model: Model,
) -> Result<Arc<dyn Provider>, CompletionError> {
    let api_key = match &config.api_key {
        Some(key) if !key.is_empty() => key.clone(),
        _ => {
            return Err(ServiceError::MissingApiKey(
                "OPENAI_API_KEY not set. Set via env var or config file.".into(),
            )
            .into())
        }
    };

    Ok(Arc::new(OpenAiProvider::new(
        api_key,
        model,
        config.base_url.clone(),
        config.client.max_tokens,
    )))
}

/// Drains a completion stream, surfacing every fragment to `on_fragment` in
/// arrival order and accumulating the final text. On failure the partial
/// accumulation is dropped — callers never see it as a result.
pub async fn drain_completion(
    mut stream: CompletionStream,
    mut on_fragment: impl FnMut(&str),
) -> Result<(String, UsageRecord), CompletionError> {
    use tokio_stream::StreamExt;

    let mut text = String::new();

    while let Some(event) = stream.next().await {
        match event {
            CompletionEvent::Delta { text: fragment } => {
                on_fragment(&fragment);
                text.push_str(&fragment);
            }
            CompletionEvent::Complete { usage } => return Ok((text, usage)),
            CompletionEvent::Error { error } => return Err(error),
        }
    }

    Err(TransportError::Stream("response stream ended before completion".into()).into())
}
