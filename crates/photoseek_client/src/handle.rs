use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;

use client_logging::{client_error, client_info};
use tokio_util::sync::CancellationToken;

use crate::api::{ApiSettings, Backend, CreateOutcome, CreateSavedRequest, FlagRequest, ReqwestBackend};
use crate::stream::ChannelEventSink;
use crate::types::{ApiError, ClientEvent, JobId};

enum ClientCommand {
    SubmitSearch {
        job_id: JobId,
        query: String,
        result_count: u32,
    },
    OpenStream {
        job_id: JobId,
        stream_key: String,
    },
    CloseStream {
        job_id: JobId,
    },
    FetchSavedList,
    CreateSaved(CreateSavedRequest),
    DeleteSaved {
        resource_id: u64,
    },
    SubmitFlag(FlagRequest),
}

/// Command-side handle to the IO thread. Dropping the handle shuts the
/// thread down and cancels any stream that is still open.
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
}

impl ClientHandle {
    pub fn new(settings: ApiSettings) -> Result<(Self, mpsc::Receiver<ClientEvent>), ApiError> {
        let backend = Arc::new(ReqwestBackend::new(settings)?);
        Ok(Self::with_backend(backend))
    }

    /// Test seam: run the command loop against any backend.
    pub fn with_backend(backend: Arc<dyn Backend>) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        thread::spawn(move || run_command_loop(backend, cmd_rx, event_tx));
        (Self { cmd_tx }, event_rx)
    }

    pub fn submit_search(&self, job_id: JobId, query: impl Into<String>, result_count: u32) {
        let _ = self.cmd_tx.send(ClientCommand::SubmitSearch {
            job_id,
            query: query.into(),
            result_count,
        });
    }

    pub fn open_stream(&self, job_id: JobId, stream_key: impl Into<String>) {
        let _ = self.cmd_tx.send(ClientCommand::OpenStream {
            job_id,
            stream_key: stream_key.into(),
        });
    }

    /// Idempotent: closing an unknown or already-closed stream is a no-op.
    pub fn close_stream(&self, job_id: JobId) {
        let _ = self.cmd_tx.send(ClientCommand::CloseStream { job_id });
    }

    pub fn fetch_saved_list(&self) {
        let _ = self.cmd_tx.send(ClientCommand::FetchSavedList);
    }

    pub fn create_saved(&self, request: CreateSavedRequest) {
        let _ = self.cmd_tx.send(ClientCommand::CreateSaved(request));
    }

    pub fn delete_saved(&self, resource_id: u64) {
        let _ = self.cmd_tx.send(ClientCommand::DeleteSaved { resource_id });
    }

    pub fn submit_flag(&self, request: FlagRequest) {
        let _ = self.cmd_tx.send(ClientCommand::SubmitFlag(request));
    }
}

fn run_command_loop(
    backend: Arc<dyn Backend>,
    cmd_rx: mpsc::Receiver<ClientCommand>,
    event_tx: mpsc::Sender<ClientEvent>,
) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            client_error!("Failed to start client runtime: {}", err);
            return;
        }
    };
    let mut open_streams: HashMap<JobId, CancellationToken> = HashMap::new();

    while let Ok(command) = cmd_rx.recv() {
        match command {
            ClientCommand::SubmitSearch {
                job_id,
                query,
                result_count,
            } => {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = match backend.submit_search(&query, result_count).await {
                        Ok(ticket) => ClientEvent::SubmitAccepted {
                            job_id,
                            stream_key: ticket.job_id,
                        },
                        Err(error) => ClientEvent::SubmitFailed { job_id, error },
                    };
                    let _ = event_tx.send(event);
                });
            }
            ClientCommand::OpenStream { job_id, stream_key } => {
                let token = CancellationToken::new();
                // A re-open for the same job replaces the old stream.
                if let Some(stale) = open_streams.insert(job_id, token.clone()) {
                    stale.cancel();
                }
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let sink = ChannelEventSink::new(event_tx);
                    backend
                        .stream_events(job_id, &stream_key, &sink, &token)
                        .await;
                });
            }
            ClientCommand::CloseStream { job_id } => {
                if let Some(token) = open_streams.remove(&job_id) {
                    token.cancel();
                }
            }
            ClientCommand::FetchSavedList => {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = match backend.list_saved().await {
                        Ok(resources) => ClientEvent::SavedListed { resources },
                        Err(error) => ClientEvent::SavedListFailed { error },
                    };
                    let _ = event_tx.send(event);
                });
            }
            ClientCommand::CreateSaved(request) => {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let image_url = request.image_url.clone();
                    let event = match backend.create_saved(&request).await {
                        Ok(CreateOutcome::Created(resource)) => ClientEvent::SavedCreated {
                            image_url,
                            resource,
                        },
                        Ok(CreateOutcome::AlreadySaved) => {
                            ClientEvent::SavedConflict { image_url }
                        }
                        Err(error) => ClientEvent::SavedCreateFailed { image_url, error },
                    };
                    let _ = event_tx.send(event);
                });
            }
            ClientCommand::DeleteSaved { resource_id } => {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let event = match backend.delete_saved(resource_id).await {
                        Ok(()) => ClientEvent::SavedDeleted { resource_id },
                        Err(error) => ClientEvent::SavedDeleteFailed { resource_id, error },
                    };
                    let _ = event_tx.send(event);
                });
            }
            ClientCommand::SubmitFlag(request) => {
                let backend = backend.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    let source_url = request.source_url.clone();
                    let event = match backend.submit_flag(&request).await {
                        Ok(()) => ClientEvent::FlagAccepted { source_url },
                        Err(error) => ClientEvent::FlagFailed { source_url, error },
                    };
                    let _ = event_tx.send(event);
                });
            }
        }
    }

    // Handle dropped: never leak a live channel.
    let open_count = open_streams.len();
    for (_, token) in open_streams.drain() {
        token.cancel();
    }
    if open_count > 0 {
        client_info!("Client loop exiting; cancelled {} open stream(s)", open_count);
    }
}
