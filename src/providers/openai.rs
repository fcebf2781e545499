use async_trait::async_trait;
use reqwest::Client;

use crate::core::error::{ServiceError, TransportError};
use crate::core::model::Model;
use crate::core::session::UsageRecord;

use super::{CompletionEvent, CompletionError, CompletionStream, Provider};

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: Model,
    base_url: String,
    max_tokens: u64,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Model, base_url: String, max_tokens: u64) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url,
            max_tokens,
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn stream_completion(&self, prompt: &str) -> Result<CompletionStream, CompletionError> {
        let body = serde_json::json!({
            "model": self.model.id.0,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.0,
            "max_tokens": self.max_tokens,
            "stream": true,
            "stream_options": { "include_usage": true },
        });

        // Single attempt: a rejection or a dropped connection is terminal for
        // the session step, the operator resets and starts over.
        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Api { status, message }.into());
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            use tokio_stream::StreamExt;

            let mut byte_stream = Box::pin(byte_stream);
            let mut buffer = LineBuffer::default();
            let mut pending_usage: Option<UsageRecord> = None;

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield CompletionEvent::Error {
                            error: TransportError::Stream(e.to_string()).into(),
                        };
                        return;
                    }
                };

                for line in buffer.push(&chunk) {
                    let data = match line.strip_prefix("data: ") {
                        Some(d) => d.trim(),
                        None => continue,
                    };

                    if data == "[DONE]" {
                        yield CompletionEvent::Complete {
                            usage: pending_usage.take().unwrap_or_default(),
                        };
                        return;
                    }

                    let json: serde_json::Value = match serde_json::from_str(data) {
                        Ok(j) => j,
                        Err(_) => continue,
                    };

                    for event in parse_chunk(&json, &mut pending_usage) {
                        yield event;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn model(&self) -> &Model {
        &self.model
    }
}

/// Reassembles SSE lines from raw network chunks. Splitting happens at the
/// byte level, before any decoding: a chunk boundary landing inside a
/// multi-byte UTF-8 sequence ("Aná" split after the 0xC3 lead byte) must not
/// mangle the fragment text.
#[derive(Default)]
pub(super) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Appends a chunk and returns every line completed by it, trimmed.
    pub(super) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            lines.push(String::from_utf8_lossy(&line).trim().to_string());
        }
        lines
    }
}

/// One SSE data chunk → zero or more fragment events. The usage record rides
/// on a trailing chunk with no choices (stream_options.include_usage); it is
/// stashed and only surfaced with the terminal event.
pub(super) fn parse_chunk(
    json: &serde_json::Value,
    pending_usage: &mut Option<UsageRecord>,
) -> Vec<CompletionEvent> {
    let mut events = Vec::new();

    if let Some(choices) = json["choices"].as_array() {
        for choice in choices {
            if let Some(text) = choice["delta"]["content"].as_str() {
                if !text.is_empty() {
                    events.push(CompletionEvent::Delta {
                        text: text.to_string(),
                    });
                }
            }
        }
    }

    if let Some(usage) = json.get("usage") {
        if !usage.is_null() {
            *pending_usage = Some(UsageRecord {
                prompt_tokens: usage["prompt_tokens"].as_u64().unwrap_or(0),
                completion_tokens: usage["completion_tokens"].as_u64().unwrap_or(0),
            });
        }
    }

    events
}
