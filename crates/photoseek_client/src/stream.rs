use bytes::Bytes;
use client_logging::client_warn;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::api::map_reqwest_error;
use crate::types::{ClientEvent, JobId, SearchResult, StreamEvent, StreamProgress};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ClientEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<ClientEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }
}

/// Incremental decoder for a `text/event-stream` body.
///
/// Frames are blank-line delimited; `event:` names the event, `data:` lines
/// accumulate (joined with newlines), `:` comments and unused fields are
/// skipped. A malformed payload yields a single `Failed` event for that
/// frame only; decoding continues with the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event_name: String,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a transport chunk; returns the events completed by it, in
    /// stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(line) = self.take_line() {
            if line.is_empty() {
                if let Some(event) = self.flush_frame() {
                    events.push(event);
                }
            } else if let Some(rest) = line.strip_prefix("event:") {
                self.event_name = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                self.data_lines
                    .push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            } else if line.starts_with(':') {
                // Keep-alive comment.
            } else {
                // id:/retry: and other fields are not used by this feed.
            }
        }
        events
    }

    fn take_line(&mut self) -> Option<String> {
        let newline = self.buffer.iter().position(|&byte| byte == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    fn flush_frame(&mut self) -> Option<StreamEvent> {
        let name = std::mem::take(&mut self.event_name);
        let data = std::mem::take(&mut self.data_lines).join("\n");
        if name.is_empty() && data.is_empty() {
            return None;
        }
        decode_event(&name, &data)
    }
}

fn decode_event(name: &str, data: &str) -> Option<StreamEvent> {
    match name {
        "progress" => Some(decode_progress(data)),
        "done" => Some(decode_done(data)),
        "error" => Some(decode_error(data)),
        other => {
            client_warn!("Skipping unknown stream event {:?}", other);
            None
        }
    }
}

fn decode_progress(data: &str) -> StreamEvent {
    #[derive(serde::Deserialize)]
    struct ProgressPayload {
        percent: u8,
        #[serde(default)]
        tag: String,
    }

    match serde_json::from_str::<ProgressPayload>(data) {
        Ok(payload) => StreamEvent::Progress(StreamProgress {
            percent: payload.percent,
            tag: payload.tag,
        }),
        Err(err) => StreamEvent::Failed {
            message: format!("malformed progress event: {err}"),
        },
    }
}

fn decode_done(data: &str) -> StreamEvent {
    match serde_json::from_str::<Vec<SearchResult>>(data) {
        Ok(results) => StreamEvent::Done { results },
        Err(err) => StreamEvent::Failed {
            message: format!("malformed done event: {err}"),
        },
    }
}

fn decode_error(data: &str) -> StreamEvent {
    #[derive(serde::Deserialize)]
    struct ErrorPayload {
        message: Option<String>,
    }

    // The error payload is implementation-defined; tolerate anything.
    let message = serde_json::from_str::<ErrorPayload>(data)
        .ok()
        .and_then(|payload| payload.message)
        .unwrap_or_else(|| {
            if data.is_empty() {
                "search failed".to_string()
            } else {
                data.to_string()
            }
        });
    StreamEvent::Failed { message }
}

/// Consume one job's event stream, pushing decoded events into `sink`.
///
/// Cancellation emits nothing: the caller closed the stream on purpose. A
/// transport end without a prior terminal event is reported as `Failed` so
/// the job never hangs in a non-terminal phase.
pub(crate) async fn run_event_stream(
    client: &reqwest::Client,
    url: Url,
    job_id: JobId,
    sink: &dyn EventSink,
    cancel: &CancellationToken,
) {
    let emit_failed = |message: String| {
        sink.emit(ClientEvent::Stream {
            job_id,
            event: StreamEvent::Failed { message },
        });
    };

    let request = client.get(url).header(ACCEPT, "text/event-stream");
    let response = tokio::select! {
        _ = cancel.cancelled() => return,
        response = request.send() => response,
    };
    let response = match response {
        Ok(response) => response,
        Err(err) => {
            emit_failed(map_reqwest_error(err).to_string());
            return;
        }
    };
    let status = response.status();
    if !status.is_success() {
        emit_failed(format!("stream refused: http status {}", status.as_u16()));
        return;
    }

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();
    let mut terminal_seen = false;
    loop {
        let chunk: Option<Result<Bytes, reqwest::Error>> = tokio::select! {
            _ = cancel.cancelled() => return,
            chunk = body.next() => chunk,
        };
        match chunk {
            Some(Ok(bytes)) => {
                for event in decoder.feed(&bytes) {
                    terminal_seen |= event.is_terminal();
                    sink.emit(ClientEvent::Stream { job_id, event });
                }
            }
            Some(Err(err)) => {
                if !terminal_seen {
                    emit_failed(map_reqwest_error(err).to_string());
                }
                return;
            }
            None => {
                if !terminal_seen {
                    emit_failed("stream closed before completion".to_string());
                }
                return;
            }
        }
    }
}
