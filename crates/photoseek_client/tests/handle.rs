use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use photoseek_client::{
    ApiError, Backend, ClientEvent, ClientHandle, CreateOutcome, CreateSavedRequest, EventSink,
    FlagRequest, JobId, JobTicket, SavedResource, StreamEvent, StreamProgress,
};
use tokio_util::sync::CancellationToken;

/// Scripted backend: answers instantly and keeps its stream open until torn
/// down. Teardown is counted via a drop guard so it registers whether the
/// task observed the cancellation or was dropped with the runtime.
#[derive(Default)]
struct FakeBackend {
    streams_torn_down: Arc<AtomicUsize>,
}

struct TeardownGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn submit_search(&self, query: &str, result_count: u32) -> Result<JobTicket, ApiError> {
        Ok(JobTicket {
            job_id: format!("{query}-{result_count}"),
        })
    }

    async fn list_saved(&self) -> Result<Vec<SavedResource>, ApiError> {
        Ok(Vec::new())
    }

    async fn create_saved(&self, _request: &CreateSavedRequest) -> Result<CreateOutcome, ApiError> {
        Ok(CreateOutcome::AlreadySaved)
    }

    async fn delete_saved(&self, _resource_id: u64) -> Result<(), ApiError> {
        Ok(())
    }

    async fn submit_flag(&self, _request: &FlagRequest) -> Result<(), ApiError> {
        Ok(())
    }

    async fn stream_events(
        &self,
        job_id: JobId,
        _stream_key: &str,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) {
        let _guard = TeardownGuard {
            counter: self.streams_torn_down.clone(),
        };
        sink.emit(ClientEvent::Stream {
            job_id,
            event: StreamEvent::Progress(StreamProgress {
                percent: 10,
                tag: "fetch".to_string(),
            }),
        });
        cancel.cancelled().await;
    }
}

fn wait_for_teardown_count(backend: &FakeBackend, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while backend.streams_torn_down.load(Ordering::SeqCst) < expected {
        assert!(Instant::now() < deadline, "stream was never torn down");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn submission_round_trips_through_the_loop() {
    let backend = Arc::new(FakeBackend::default());
    let (handle, events) = ClientHandle::with_backend(backend);

    handle.submit_search(1, "cats", 20);
    let event = events.recv_timeout(Duration::from_secs(2)).expect("event");
    assert_eq!(
        event,
        ClientEvent::SubmitAccepted {
            job_id: 1,
            stream_key: "cats-20".to_string(),
        }
    );
}

#[test]
fn close_stream_cancels_and_is_idempotent() {
    let backend = Arc::new(FakeBackend::default());
    let (handle, events) = ClientHandle::with_backend(backend.clone());

    handle.open_stream(1, "abc");
    let event = events.recv_timeout(Duration::from_secs(2)).expect("event");
    assert!(matches!(event, ClientEvent::Stream { job_id: 1, .. }));

    handle.close_stream(1);
    wait_for_teardown_count(&backend, 1);

    // Closing again, and closing a stream that never existed, are no-ops;
    // the loop keeps serving commands afterwards.
    handle.close_stream(1);
    handle.close_stream(99);
    handle.fetch_saved_list();
    let event = events.recv_timeout(Duration::from_secs(2)).expect("event");
    assert_eq!(event, ClientEvent::SavedListed { resources: Vec::new() });
}

#[test]
fn dropping_the_handle_closes_open_streams() {
    let backend = Arc::new(FakeBackend::default());
    let (handle, events) = ClientHandle::with_backend(backend.clone());

    handle.open_stream(1, "abc");
    let _ = events.recv_timeout(Duration::from_secs(2)).expect("event");

    drop(handle);
    wait_for_teardown_count(&backend, 1);
}
