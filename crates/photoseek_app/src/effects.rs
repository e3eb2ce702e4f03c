use client_logging::{client_info, client_warn};
use photoseek_client::{ClientEvent, ClientHandle, CreateSavedRequest, FlagRequest, StreamEvent};
use photoseek_core::{Author, Effect, Msg, SavedRecord, SearchResult};

/// Executes core effects against the IO layer.
pub struct EffectRunner {
    client: ClientHandle,
}

impl EffectRunner {
    pub fn new(client: ClientHandle) -> Self {
        Self { client }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitSearch {
                    job_id,
                    query,
                    result_count,
                } => {
                    client_info!("SubmitSearch job_id={} query={:?}", job_id, query);
                    self.client.submit_search(job_id, query, result_count);
                }
                Effect::OpenStream { job_id, stream_key } => {
                    client_info!("OpenStream job_id={} key={}", job_id, stream_key);
                    self.client.open_stream(job_id, stream_key);
                }
                Effect::CloseStream { job_id } => {
                    self.client.close_stream(job_id);
                }
                Effect::FetchSavedList => {
                    self.client.fetch_saved_list();
                }
                Effect::CreateSaved {
                    image_url,
                    description,
                    provider,
                } => {
                    self.client.create_saved(CreateSavedRequest {
                        image_url,
                        description,
                        provider,
                    });
                }
                Effect::DeleteSaved { resource_id } => {
                    self.client.delete_saved(resource_id);
                }
                Effect::SubmitFlag {
                    source_url,
                    provider,
                    reason,
                } => {
                    self.client.submit_flag(FlagRequest {
                        source_url,
                        provider,
                        reason,
                    });
                }
            }
        }
    }
}

/// Translate an IO event into a core message.
pub fn map_event(event: ClientEvent) -> Msg {
    match event {
        ClientEvent::SubmitAccepted { job_id, stream_key } => {
            Msg::SearchAccepted { job_id, stream_key }
        }
        ClientEvent::SubmitFailed { job_id, error } => {
            client_warn!("Submission for job {} failed: {}", job_id, error);
            Msg::SearchRejected {
                job_id,
                message: error.to_string(),
            }
        }
        ClientEvent::Stream { job_id, event } => match event {
            StreamEvent::Progress(progress) => Msg::StreamProgress {
                job_id,
                percent: progress.percent,
                tag: progress.tag,
            },
            StreamEvent::Done { results } => Msg::StreamCompleted {
                job_id,
                results: results.into_iter().map(map_result).collect(),
            },
            StreamEvent::Failed { message } => {
                client_warn!("Stream for job {} failed: {}", job_id, message);
                Msg::StreamFailed { job_id, message }
            }
        },
        ClientEvent::SavedListed { resources } => {
            Msg::SavedListLoaded(resources.into_iter().map(map_saved).collect())
        }
        ClientEvent::SavedListFailed { error } => {
            client_warn!("Failed to load saved photos: {}", error);
            Msg::SavedListFailed {
                message: error.to_string(),
            }
        }
        ClientEvent::SavedCreated {
            image_url,
            resource,
        } => Msg::SaveConfirmed {
            image_url,
            record: map_saved(resource),
        },
        ClientEvent::SavedConflict { image_url } => Msg::SaveConflicted { image_url },
        ClientEvent::SavedCreateFailed { image_url, error } => Msg::SaveFailed {
            image_url,
            message: error.to_string(),
        },
        ClientEvent::SavedDeleted { resource_id } => Msg::RemoveConfirmed { resource_id },
        ClientEvent::SavedDeleteFailed { resource_id, error } => Msg::RemoveFailed {
            resource_id,
            message: error.to_string(),
        },
        ClientEvent::FlagAccepted { source_url } => Msg::FlagAccepted { source_url },
        ClientEvent::FlagFailed { source_url, error } => {
            client_warn!("Flagging {} failed: {}", source_url, error);
            Msg::FlagFailed { source_url }
        }
    }
}

fn map_result(result: photoseek_client::SearchResult) -> SearchResult {
    SearchResult {
        id: result.id,
        image_url: result.image_url,
        description: result.description,
        keywords: result.keywords,
        author: Author {
            name: result.author.name,
            url: result.author.url,
        },
        source_url: result.source_url,
        provider: result.provider,
    }
}

fn map_saved(resource: photoseek_client::SavedResource) -> SavedRecord {
    SavedRecord {
        id: Some(resource.id),
        image_url: resource.image_url,
        description: resource.description,
        provider: resource.provider,
        created_at: resource.created_at,
    }
}
