use crate::{AppState, Effect, Msg, Notice, SearchProgress, DEFAULT_RESULT_COUNT};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QueryEdited(text) => {
            state.edit_query(text);
            Vec::new()
        }
        Msg::SearchSubmitted => {
            let Some(query) = normalize_query(state.query_input()) else {
                // Rejected before any network call; the in-flight job, if
                // any, is left untouched.
                state.reject_invalid_query();
                return (state, Vec::new());
            };
            let new_search = state.begin_search(query.clone());
            let mut effects = Vec::with_capacity(2);
            if let Some(job_id) = new_search.close_stream {
                effects.push(Effect::CloseStream { job_id });
            }
            effects.push(Effect::SubmitSearch {
                job_id: new_search.job_id,
                query,
                result_count: DEFAULT_RESULT_COUNT,
            });
            effects
        }
        Msg::SearchAccepted { job_id, stream_key } => {
            // A stale ack (job superseded while the request was in flight)
            // must not open a stream.
            if state.accept_submission(job_id, stream_key.clone()) {
                vec![Effect::OpenStream { job_id, stream_key }]
            } else {
                Vec::new()
            }
        }
        Msg::SearchRejected { job_id, message } => {
            state.reject_submission(job_id, message);
            Vec::new()
        }
        Msg::StreamProgress {
            job_id,
            percent,
            tag,
        } => {
            state.apply_progress(job_id, SearchProgress { percent, tag });
            Vec::new()
        }
        Msg::StreamCompleted { job_id, results } => {
            if state.complete_search(job_id, results) {
                vec![Effect::CloseStream { job_id }]
            } else {
                Vec::new()
            }
        }
        Msg::StreamFailed { job_id, message } => {
            if state.fail_stream(job_id, message) {
                vec![Effect::CloseStream { job_id }]
            } else {
                Vec::new()
            }
        }
        Msg::SignedIn | Msg::SavedRefreshRequested => {
            if state.begin_saved_load() {
                vec![Effect::FetchSavedList]
            } else {
                Vec::new()
            }
        }
        Msg::SignedOut => {
            state.clear_saved();
            Vec::new()
        }
        Msg::SavedListLoaded(records) => {
            state.replace_saved(records);
            Vec::new()
        }
        Msg::SavedListFailed { message: _ } => {
            // Degrades silently to "no known saved photos".
            state.clear_saved_after_load_failure();
            Vec::new()
        }
        Msg::SaveRequested { result } => {
            // Second request for the same URL while one is in flight (or
            // already a member) must not issue another server call.
            if state.begin_save(&result.image_url) {
                vec![Effect::CreateSaved {
                    image_url: result.image_url,
                    description: result.description,
                    provider: result.provider,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::SaveConfirmed { image_url, record } => {
            state.confirm_save(&image_url, record);
            Vec::new()
        }
        Msg::SaveConflicted { image_url } => {
            state.recover_save_conflict(&image_url);
            Vec::new()
        }
        Msg::SaveFailed { image_url, message } => {
            state.fail_save(&image_url);
            state.raise_notice(Notice::PhotoSaveFailed { message });
            Vec::new()
        }
        Msg::RemoveRequested { resource_id } => {
            if state.begin_remove(resource_id) {
                vec![Effect::DeleteSaved { resource_id }]
            } else {
                Vec::new()
            }
        }
        Msg::RemoveConfirmed { resource_id } => {
            state.confirm_remove(resource_id);
            Vec::new()
        }
        Msg::RemoveFailed {
            resource_id,
            message,
        } => {
            state.fail_remove(resource_id);
            state.raise_notice(Notice::PhotoRemoveFailed { message });
            Vec::new()
        }
        Msg::FlagSubmitted {
            source_url,
            provider,
        } => {
            if state.is_flagged(&source_url) {
                Vec::new()
            } else {
                vec![Effect::SubmitFlag {
                    source_url,
                    provider,
                    reason: None,
                }]
            }
        }
        Msg::FlagAccepted { source_url } => {
            state.mark_flagged(source_url);
            state.raise_notice(Notice::PostSuspended);
            Vec::new()
        }
        Msg::FlagFailed { source_url: _ } => {
            state.raise_notice(Notice::SuspendFailed);
            Vec::new()
        }
        Msg::NoticeDismissed { seq } => {
            state.dismiss_notice(seq);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Trim and collapse internal whitespace runs; `None` for an empty query.
fn normalize_query(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
