use super::openai::{parse_chunk, LineBuffer};
use super::{drain_completion, CompletionError, CompletionEvent};

use crate::core::error::{ServiceError, TransportError};
use crate::core::session::UsageRecord;

fn boxed(
    events: Vec<CompletionEvent>,
) -> std::pin::Pin<Box<dyn futures_core::Stream<Item = CompletionEvent> + Send>> {
    Box::pin(tokio_stream::iter(events))
}

#[tokio::test]
async fn test_drain_accumulates_fragments_in_order() {
    let stream = boxed(vec![
        CompletionEvent::Delta { text: "Aná".into() },
        CompletionEvent::Delta {
            text: "lise concluída.".into(),
        },
        CompletionEvent::Complete {
            usage: UsageRecord {
                prompt_tokens: 10,
                completion_tokens: 5,
            },
        },
    ]);

    let mut seen = Vec::new();
    let (text, usage) = drain_completion(stream, |fragment| seen.push(fragment.to_string()))
        .await
        .unwrap();

    assert_eq!(text, "Análise concluída.");
    assert_eq!(seen, vec!["Aná".to_string(), "lise concluída.".to_string()]);
    assert_eq!(usage.prompt_tokens, 10);
    assert_eq!(usage.completion_tokens, 5);
}

#[tokio::test]
async fn test_drain_usage_only_after_terminal_fragment() {
    let stream = boxed(vec![
        CompletionEvent::Delta { text: "a".into() },
        CompletionEvent::Complete {
            usage: UsageRecord::default(),
        },
        // Anything after the terminal event must be ignored
        CompletionEvent::Delta {
            text: "ghost".into(),
        },
    ]);

    let (text, _) = drain_completion(stream, |_| {}).await.unwrap();
    assert_eq!(text, "a");
}

#[tokio::test]
async fn test_drain_discards_partial_text_on_error() {
    let stream = boxed(vec![
        CompletionEvent::Delta {
            text: "partial".into(),
        },
        CompletionEvent::Error {
            error: TransportError::Stream("connection reset".into()).into(),
        },
    ]);

    let result = drain_completion(stream, |_| {}).await;
    assert!(matches!(result, Err(CompletionError::Transport(_))));
}

#[tokio::test]
async fn test_drain_fails_without_terminal_event() {
    let stream = boxed(vec![CompletionEvent::Delta { text: "x".into() }]);
    let result = drain_completion(stream, |_| {}).await;
    assert!(matches!(
        result,
        Err(CompletionError::Transport(TransportError::Stream(_)))
    ));
}

#[tokio::test]
async fn test_auth_failure_is_a_service_error() {
    let stream = boxed(vec![CompletionEvent::Error {
        error: ServiceError::Api {
            status: 401,
            message: "Incorrect API key provided".into(),
        }
        .into(),
    }]);

    let err = drain_completion(stream, |_| {}).await.unwrap_err();
    match err {
        CompletionError::Service(ServiceError::Api { status, message }) => {
            assert_eq!(status, 401);
            // Surfaced verbatim
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[test]
fn test_line_buffer_survives_chunk_split_inside_utf8_sequence() {
    // "Aná" is C3 A1 on the wire; the network may hand the two bytes over
    // in different chunks and neither half may be decoded on its own
    let payload = "data: {\"choices\":[{\"delta\":{\"content\":\"Aná\"}}]}\n".as_bytes();
    let split = payload
        .iter()
        .position(|&b| b == 0xC3)
        .expect("multi-byte sequence in payload")
        + 1;

    let mut buffer = LineBuffer::default();
    assert!(buffer.push(&payload[..split]).is_empty());

    let lines = buffer.push(&payload[split..]);
    assert_eq!(lines.len(), 1);

    let data = lines[0].strip_prefix("data: ").unwrap();
    let json: serde_json::Value = serde_json::from_str(data).unwrap();
    let mut usage = None;
    let events = parse_chunk(&json, &mut usage);
    match &events[0] {
        CompletionEvent::Delta { text } => {
            assert_eq!(text, "Aná");
            assert!(!text.contains('\u{FFFD}'));
        }
        other => panic!("expected delta, got {other:?}"),
    }
}

#[test]
fn test_line_buffer_yields_multiple_lines_per_chunk() {
    let mut buffer = LineBuffer::default();
    let lines = buffer.push(b"data: one\n\ndata: two\ndata: tr");
    assert_eq!(lines, vec!["data: one", "", "data: two"]);

    let lines = buffer.push(b"ailing\n");
    assert_eq!(lines, vec!["data: trailing"]);
}

#[test]
fn test_parse_chunk_content_delta() {
    let json: serde_json::Value = serde_json::from_str(
        r#"{"choices":[{"delta":{"content":"Aná"},"finish_reason":null}]}"#,
    )
    .unwrap();

    let mut usage = None;
    let events = parse_chunk(&json, &mut usage);
    assert_eq!(events.len(), 1);
    match &events[0] {
        CompletionEvent::Delta { text } => assert_eq!(text, "Aná"),
        other => panic!("expected delta, got {other:?}"),
    }
    assert!(usage.is_none());
}

#[test]
fn test_parse_chunk_stashes_trailing_usage() {
    // With stream_options.include_usage the usage rides on a chunk with no
    // choices, after the finish chunk
    let json: serde_json::Value = serde_json::from_str(
        r#"{"choices":[],"usage":{"prompt_tokens":50000,"completion_tokens":1234}}"#,
    )
    .unwrap();

    let mut usage = None;
    let events = parse_chunk(&json, &mut usage);
    assert!(events.is_empty());
    assert_eq!(
        usage,
        Some(UsageRecord {
            prompt_tokens: 50_000,
            completion_tokens: 1_234,
        })
    );
}

#[test]
fn test_parse_chunk_ignores_empty_delta() {
    let json: serde_json::Value = serde_json::from_str(
        r#"{"choices":[{"delta":{"role":"assistant"},"finish_reason":null}],"usage":null}"#,
    )
    .unwrap();

    let mut usage = None;
    let events = parse_chunk(&json, &mut usage);
    assert!(events.is_empty());
    assert!(usage.is_none());
}
