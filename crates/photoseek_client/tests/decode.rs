use photoseek_client::{SseDecoder, StreamEvent};
use pretty_assertions::assert_eq;

fn progress_frame(percent: u8, tag: &str) -> String {
    format!("event: progress\ndata: {{\"percent\":{percent},\"tag\":\"{tag}\"}}\n\n")
}

const DONE_FRAME: &str = concat!(
    "event: done\n",
    "data: [{\"id\":\"1\",\"image_url\":\"https://x/1.jpg\",",
    "\"author\":{\"name\":\"Alex\",\"url\":\"https://x/alex\"},",
    "\"source_url\":\"https://x/posts/1\",\"provider\":\"pixabay\"}]\n",
    "\n",
);

#[test]
fn decodes_frames_in_stream_order() {
    let mut decoder = SseDecoder::new();
    let body = format!(
        "{}{}{}",
        progress_frame(40, "embedding"),
        progress_frame(90, "ranking"),
        DONE_FRAME
    );

    let events = decoder.feed(body.as_bytes());
    assert_eq!(events.len(), 3);
    match &events[0] {
        StreamEvent::Progress(progress) => {
            assert_eq!(progress.percent, 40);
            assert_eq!(progress.tag, "embedding");
        }
        other => panic!("expected progress, got {other:?}"),
    }
    match &events[2] {
        StreamEvent::Done { results } => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].image_url, "https://x/1.jpg");
            // Optional fields default when the feed omits them.
            assert_eq!(results[0].description, None);
            assert!(results[0].keywords.is_empty());
        }
        other => panic!("expected done, got {other:?}"),
    }
}

#[test]
fn frames_split_across_chunks_are_reassembled() {
    let mut decoder = SseDecoder::new();
    let frame = progress_frame(40, "embedding");
    let (head, tail) = frame.split_at(17);

    assert!(decoder.feed(head.as_bytes()).is_empty());
    let events = decoder.feed(tail.as_bytes());
    assert_eq!(
        events,
        vec![StreamEvent::Progress(photoseek_client::StreamProgress {
            percent: 40,
            tag: "embedding".to_string(),
        })]
    );
}

#[test]
fn malformed_payload_fails_only_that_event() {
    let mut decoder = SseDecoder::new();
    let body = format!("event: progress\ndata: {{broken\n\n{DONE_FRAME}");

    let events = decoder.feed(body.as_bytes());
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], StreamEvent::Failed { .. }));
    assert!(matches!(events[1], StreamEvent::Done { .. }));
}

#[test]
fn comments_and_unknown_events_are_skipped() {
    let mut decoder = SseDecoder::new();
    let body = ": keep-alive\n\nevent: ping\ndata: {}\n\n";

    assert!(decoder.feed(body.as_bytes()).is_empty());
}

#[test]
fn crlf_line_endings_are_tolerated() {
    let mut decoder = SseDecoder::new();
    let body = "event: progress\r\ndata: {\"percent\":10,\"tag\":\"fetch\"}\r\n\r\n";

    let events = decoder.feed(body.as_bytes());
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], StreamEvent::Progress(_)));
}

#[test]
fn multi_line_data_is_joined() {
    let mut decoder = SseDecoder::new();
    // The json payload may arrive pretty-printed over several data lines.
    let body = "event: done\ndata: [\ndata: ]\n\n";

    let events = decoder.feed(body.as_bytes());
    assert_eq!(events, vec![StreamEvent::Done { results: Vec::new() }]);
}

#[test]
fn error_event_payload_is_tolerated() {
    let mut decoder = SseDecoder::new();

    let events = decoder.feed(b"event: error\ndata: {\"message\":\"model crashed\"}\n\n");
    assert_eq!(
        events,
        vec![StreamEvent::Failed {
            message: "model crashed".to_string(),
        }]
    );

    // Non-JSON payloads are carried through verbatim.
    let events = decoder.feed(b"event: error\ndata: out of workers\n\n");
    assert_eq!(
        events,
        vec![StreamEvent::Failed {
            message: "out of workers".to_string(),
        }]
    );
}
