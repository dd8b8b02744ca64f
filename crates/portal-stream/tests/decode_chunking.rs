use anyhow::Result;
use futures::{stream, StreamExt};
use portal_stream::{decode_sse, StreamEvent};

const TURN: &[u8] = b"data: {\"type\":\"thinking\",\"content\":\"checking cluster\"}\n\
data: {\"type\":\"agent_output\",\"agent\":\"argocd\",\"content\":\"All synced\",\"tools_used\":[\"sync_status\"]}\n\
data: {\"type\":\"message\",\"content\":\"Your cluster is healthy.\"}\n\
data: {\"type\":\"done\"}\n";

fn byte_stream(
    chunks: Vec<&'static [u8]>,
) -> impl futures::Stream<Item = Result<&'static [u8]>> + Send {
    stream::iter(chunks.into_iter().map(Ok))
}

async fn collect_events(
    input: impl futures::Stream<Item = Result<&'static [u8]>> + Send + 'static,
) -> Vec<StreamEvent> {
    decode_sse(input)
        .map(|event| event.expect("unexpected stream error"))
        .collect()
        .await
}

fn expected_turn_events() -> Vec<StreamEvent> {
    vec![
        StreamEvent::Thinking {
            content: "checking cluster".to_string(),
        },
        StreamEvent::AgentOutput {
            content: "All synced".to_string(),
            agent: "argocd".to_string(),
            tools_used: vec!["sync_status".to_string()],
        },
        StreamEvent::Message {
            content: "Your cluster is healthy.".to_string(),
        },
        StreamEvent::Done,
    ]
}

#[tokio::test]
async fn test_whole_turn_in_one_chunk() {
    let events = collect_events(byte_stream(vec![TURN])).await;
    assert_eq!(events, expected_turn_events());
}

#[tokio::test]
async fn test_one_byte_at_a_time_yields_identical_sequence() {
    let chunks: Vec<&'static [u8]> = (0..TURN.len()).map(|i| &TURN[i..i + 1]).collect();
    let events = collect_events(byte_stream(chunks)).await;
    assert_eq!(events, expected_turn_events());
}

#[tokio::test]
async fn test_split_mid_marker_and_mid_json() {
    let chunks: Vec<&'static [u8]> = vec![b"dat", b"a: {\"type\":\"don", b"e\"}\n"];
    let events = collect_events(byte_stream(chunks)).await;
    assert_eq!(events, vec![StreamEvent::Done]);
}

#[tokio::test]
async fn test_invalid_json_line_does_not_abort_the_stream() {
    let input: &'static [u8] = b"data: {not json at all\ndata: {\"type\":\"done\"}\n";
    let events = collect_events(byte_stream(vec![input])).await;
    assert_eq!(events, vec![StreamEvent::Done]);
}

#[tokio::test]
async fn test_non_data_lines_are_skipped() {
    let input: &'static [u8] = b"event: thinking\n\
: keep-alive\n\
\n\
data: {\"type\":\"message\",\"content\":\"hi\"}\n";
    let events = collect_events(byte_stream(vec![input])).await;
    assert_eq!(
        events,
        vec![StreamEvent::Message {
            content: "hi".to_string()
        }]
    );
}

#[tokio::test]
async fn test_final_line_without_newline_is_flushed() {
    let input: &'static [u8] = b"data: {\"type\":\"message\",\"content\":\"tail\"}";
    let events = collect_events(byte_stream(vec![input])).await;
    assert_eq!(
        events,
        vec![StreamEvent::Message {
            content: "tail".to_string()
        }]
    );
}

#[tokio::test]
async fn test_unknown_event_kind_is_delivered_as_unknown() {
    let input: &'static [u8] = b"data: {\"type\":\"telemetry\",\"content\":\"x\"}\n";
    let events = collect_events(byte_stream(vec![input])).await;
    assert_eq!(events, vec![StreamEvent::Unknown]);
}

#[tokio::test]
async fn test_read_failure_is_terminal_after_prior_events() {
    let chunks: Vec<Result<&'static [u8]>> = vec![
        Ok(b"data: {\"type\":\"thinking\",\"content\":\"a\"}\n"),
        Err(anyhow::anyhow!("connection reset")),
        Ok(b"data: {\"type\":\"done\"}\n"),
    ];

    let mut events = decode_sse(stream::iter(chunks));

    assert_eq!(
        events.next().await.unwrap().unwrap(),
        StreamEvent::Thinking {
            content: "a".to_string()
        }
    );
    assert!(events.next().await.unwrap().is_err());
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn test_order_preserved_across_awkward_splits() {
    // Split inside the newline boundary between two events.
    let chunks: Vec<&'static [u8]> = vec![
        b"data: {\"type\":\"thinking\",\"content\":\"first\"}\ndata: {\"type\":\"thin",
        b"king\",\"content\":\"second\"}\ndata: {\"type\":\"done\"}\n",
    ];
    let events = collect_events(byte_stream(chunks)).await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Thinking {
                content: "first".to_string()
            },
            StreamEvent::Thinking {
                content: "second".to_string()
            },
            StreamEvent::Done,
        ]
    );
}
